//! Azure DevOps web links

use url::Url;

use crate::Result;

const BASE: &str = "https://dev.azure.com/";

fn base_with(segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(BASE)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `https://dev.azure.com/{org}/{project}/_workitems/edit/{id}`
pub fn work_item_url(org: &str, project: &str, id: u64) -> Result<Url> {
    let id = id.to_string();
    base_with(&[org, project, "_workitems", "edit", &id])
}

/// `https://dev.azure.com/{org}/{project}/_git/{repository}/pullrequest/{id}`
pub fn pull_request_url(org: &str, project: &str, repository: &str, id: u64) -> Result<Url> {
    let id = id.to_string();
    base_with(&[org, project, "_git", repository, "pullrequest", &id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_url() {
        let url = work_item_url("contoso", "Payments", 12345).unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/Payments/_workitems/edit/12345"
        );
    }

    #[test]
    fn test_project_name_is_encoded() {
        let url = work_item_url("contoso", "Retail Banking", 7).unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/Retail%20Banking/_workitems/edit/7"
        );
    }

    #[test]
    fn test_pull_request_url() {
        let url = pull_request_url("contoso", "Payments", "payments-api", 881).unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/Payments/_git/payments-api/pullrequest/881"
        );
    }
}
