//! Pull the fenced CLI block out of free-form backend output.

use std::sync::LazyLock;

use regex::Regex;

/// Fence with an optional language tag on the opening line.
static RE_TAGGED_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+.-]*[ \t]*\r?\n(.*?)```").unwrap());

/// Any fence, contents possibly on the same line.
static RE_BARE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());

/// Trimmed interior of the first fenced block, or the trimmed text when
/// there is no fence.
pub fn extract_cli_block(text: &str) -> String {
    RE_TAGGED_FENCE
        .captures(text)
        .or_else(|| RE_BARE_FENCE.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fence_with_surrounding_text() {
        let text = "intro text\n```\nvlan 10\n name Users\n```\ntrailing";
        assert_eq!(extract_cli_block(text), "vlan 10\n name Users");
    }

    #[test]
    fn language_tagged_fence() {
        let text =
            "Here you go:\n```cisco\ninterface Vlan30\n ip address 192.168.30.1 255.255.255.0\n```";
        assert_eq!(
            extract_cli_block(text),
            "interface Vlan30\n ip address 192.168.30.1 255.255.255.0"
        );
    }

    #[test]
    fn bash_tag() {
        assert_eq!(extract_cli_block("```bash\nshow vlan brief\n```"), "show vlan brief");
    }

    #[test]
    fn inline_fence() {
        assert_eq!(extract_cli_block("Use ```vlan 40``` here"), "vlan 40");
    }

    #[test]
    fn first_block_wins() {
        let text = "```\nvlan 10\n```\nand\n```\nvlan 20\n```";
        assert_eq!(extract_cli_block(text), "vlan 10");
    }

    #[test]
    fn no_fence_returns_trimmed_text() {
        assert_eq!(extract_cli_block("  vlan 50\n name Guest \n"), "vlan 50\n name Guest");
    }

    #[test]
    fn unterminated_fence_is_left_alone() {
        assert_eq!(extract_cli_block("```\nvlan 60"), "```\nvlan 60");
    }
}
