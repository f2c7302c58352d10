/// Returns the first top-level `{ ... }` block in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not count
/// toward nesting, so narration containing `{` or `}` cannot cut the block
/// short. Returns `None` when no block opens or the first one never closes.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_surrounded_by_prose() {
        let reply = "Sure! Here are the scenes:\n{\"scenes\": []}\nEnjoy the story.";
        assert_eq!(find_json_object(reply), Some("{\"scenes\": []}"));
    }

    #[test]
    fn test_code_fence() {
        let reply = "```json\n{\"a\": {\"b\": 1}}\n```";
        assert_eq!(find_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_braces_inside_strings() {
        let reply = r#"{"explainer": "He drew } and { in the sand", "q": "say \"}\""} trailing }"#;
        assert_eq!(
            find_json_object(reply),
            Some(r#"{"explainer": "He drew } and { in the sand", "q": "say \"}\""}"#)
        );
    }

    #[test]
    fn test_only_first_block_is_taken() {
        let reply = "{\"first\": 1} and then {\"second\": 2}";
        assert_eq!(find_json_object(reply), Some("{\"first\": 1}"));
    }

    #[test]
    fn test_no_block() {
        assert_eq!(find_json_object("I cannot help with that."), None);
        assert_eq!(find_json_object("closing only }"), None);
    }

    #[test]
    fn test_unterminated_block() {
        assert_eq!(find_json_object("{\"scenes\": [ {\"a\": 1}"), None);
    }

    #[test]
    fn test_multibyte_text() {
        let reply = "場景如下：{\"title\": \"沙丘\"}。";
        assert_eq!(find_json_object(reply), Some("{\"title\": \"沙丘\"}"));
    }
}
