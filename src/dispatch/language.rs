//! 语言路径前缀规则
//!
//! 发布站大多以葡萄牙语为默认语言；倒置域名（默认英语）在缺少
//! `language` 参数时补 `/en` 前缀。前缀只作用于 URL 的 pathname。

use url::Url;

use crate::domains::DomainRegistry;

/// Apply the language prefix rules to `url`'s path.
///
/// `pt` is the network's native language and never gets a prefix.
/// Inverted-language domain: missing/`en` -> `/en` prefix, anything else
/// -> `/<language>` prefix. Regular domain: missing -> unchanged,
/// anything else -> `/<language>`.
pub fn apply_language_prefix(
    url: &mut Url,
    domain: &str,
    language: Option<&str>,
    registry: &DomainRegistry,
) {
    // 空字符串按缺失处理
    let language = language.map(str::trim).filter(|l| !l.is_empty());

    let prefix = if registry.is_inverted_language(domain) {
        match language {
            None | Some("en") => Some("en"),
            Some("pt") => None,
            Some(other) => Some(other),
        }
    } else {
        match language {
            None | Some("pt") => None,
            Some(other) => Some(other),
        }
    };

    if let Some(prefix) = prefix {
        let path = url.path().to_string();
        url.set_path(&format!("/{prefix}{path}"));
    }
}
