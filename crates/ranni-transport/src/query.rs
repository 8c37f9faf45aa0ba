//! Credential query parameters.

use url::Url;

/// Appends `access_token=<token>` to `url`. Empty tokens are ignored.
pub fn with_access_token(mut url: Url, access_token: Option<&str>) -> Url {
    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        url.query_pairs_mut().append_pair("access_token", token);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_appended_after_existing_pairs() {
        let url = Url::parse("http://127.0.0.1:5700/get_group_member_list?group_id=1").unwrap();
        let url = with_access_token(url, Some("t0k"));
        assert_eq!(url.query(), Some("group_id=1&access_token=t0k"));
    }

    #[test]
    fn missing_or_empty_token_leaves_url_alone() {
        let url = Url::parse("ws://127.0.0.1:6700/").unwrap();
        assert_eq!(with_access_token(url.clone(), None), url);
        assert_eq!(with_access_token(url.clone(), Some("")), url);
    }
}
