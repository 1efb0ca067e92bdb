//! UTM 参数装饰
//!
//! 三个主参数带默认值，其余只透传请求里出现的值。`Url` 负责
//! `?`/`&` 的选择和百分号编码。

use url::Url;

use crate::dispatch::DispatchParams;

/// 默认 utm_source
pub const DEFAULT_UTM_SOURCE: &str = "redron";
/// 默认 utm_medium
pub const DEFAULT_UTM_MEDIUM: &str = "broadcast";
/// link_id 也为空时的 utm_campaign 兜底
pub const DEFAULT_UTM_CAMPAIGN: &str = "direct";

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Append the UTM parameter bag to `url`.
pub fn decorate(url: &mut Url, params: &DispatchParams, link_id: &str) {
    let campaign = non_empty(&params.utm_campaign)
        .or(if link_id.is_empty() { None } else { Some(link_id) })
        .unwrap_or(DEFAULT_UTM_CAMPAIGN);

    let mut pairs = url.query_pairs_mut();
    pairs.append_pair(
        "utm_source",
        non_empty(&params.utm_source).unwrap_or(DEFAULT_UTM_SOURCE),
    );
    pairs.append_pair(
        "utm_medium",
        non_empty(&params.utm_medium).unwrap_or(DEFAULT_UTM_MEDIUM),
    );
    pairs.append_pair("utm_campaign", campaign);

    // 只透传请求中出现的参数
    if let Some(term) = non_empty(&params.utm_term) {
        pairs.append_pair("utm_term", term);
    }
    if let Some(content) = non_empty(&params.utm_content) {
        pairs.append_pair("utm_content", content);
    }
    if let Some(fbclid) = non_empty(&params.fbclid) {
        pairs.append_pair("fbclid", fbclid);
    }
    if let Some(gclid) = non_empty(&params.gclid) {
        pairs.append_pair("gclid", gclid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decorated(url: &str, params: &DispatchParams, link_id: &str) -> String {
        let mut url = Url::parse(url).unwrap();
        decorate(&mut url, params, link_id);
        url.into()
    }

    #[test]
    fn test_defaults_applied() {
        let url = decorated("https://b.com/?p=2", &DispatchParams::default(), "best_b.com_2");
        assert_eq!(
            url,
            "https://b.com/?p=2&utm_source=redron&utm_medium=broadcast&utm_campaign=best_b.com_2"
        );
    }

    #[test]
    fn test_question_mark_when_no_query() {
        let url = decorated("https://a.com/random", &DispatchParams::default(), "random_a.com");
        assert_eq!(
            url,
            "https://a.com/random?utm_source=redron&utm_medium=broadcast&utm_campaign=random_a.com"
        );
    }

    #[test]
    fn test_request_values_win() {
        let params = DispatchParams {
            utm_source: Some("newsletter".to_string()),
            utm_medium: Some("email".to_string()),
            utm_campaign: Some("august".to_string()),
            ..Default::default()
        };
        let url = decorated("https://a.com/?p=1", &params, "best_a.com_1");
        assert!(url.contains("utm_source=newsletter"));
        assert!(url.contains("utm_medium=email"));
        assert!(url.contains("utm_campaign=august"));
        assert!(!url.contains("best_a.com_1"));
    }

    #[test]
    fn test_empty_request_values_fall_back() {
        let params = DispatchParams {
            utm_source: Some("".to_string()),
            utm_campaign: Some(" ".to_string()),
            ..Default::default()
        };
        let url = decorated("https://a.com/?p=1", &params, "best_a.com_1");
        assert!(url.contains("utm_source=redron"));
        assert!(url.contains("utm_campaign=best_a.com_1"));
    }

    #[test]
    fn test_campaign_falls_back_to_direct() {
        let url = decorated("https://a.com/", &DispatchParams::default(), "");
        assert!(url.contains("utm_campaign=direct"));
    }

    #[test]
    fn test_passthrough_only_when_present() {
        let url = decorated("https://a.com/", &DispatchParams::default(), "x");
        assert!(!url.contains("utm_term"));
        assert!(!url.contains("fbclid"));

        let params = DispatchParams {
            utm_term: Some("apps".to_string()),
            fbclid: Some("abc123".to_string()),
            gclid: Some("xyz".to_string()),
            ..Default::default()
        };
        let url = decorated("https://a.com/", &params, "x");
        assert!(url.contains("utm_term=apps"));
        assert!(url.contains("fbclid=abc123"));
        assert!(url.contains("gclid=xyz"));
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let params = DispatchParams {
            utm_campaign: Some("summer sale/2026".to_string()),
            ..Default::default()
        };
        let url = decorated("https://a.com/", &params, "x");
        let parsed = Url::parse(&url).unwrap();
        let campaign = parsed
            .query_pairs()
            .find(|(k, _)| k == "utm_campaign")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(campaign, "summer sale/2026");
    }
}
