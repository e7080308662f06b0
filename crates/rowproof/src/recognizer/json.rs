/// Returns the first balanced JSON object embedded in `response`.
///
/// Model output often wraps the object in prose or code fences. String
/// literals and escapes are tracked so braces inside values do not count.
/// Returns `None` when there is no `{` or the object never closes.
pub fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + i + 1]);
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
    fn test_plain_object() {
        assert_eq!(extract_json(r#"{"minutes": 45}"#), Some(r#"{"minutes": 45}"#));
    }

    #[test]
    fn test_object_in_prose_and_fences() {
        let response = "Here is the result:\n```json\n{\"date\": \"2024-03-05\", \"nested\": {\"a\": 1}}\n```\nDone.";
        assert_eq!(
            extract_json(response),
            Some("{\"date\": \"2024-03-05\", \"nested\": {\"a\": 1}}")
        );
    }

    #[test]
    fn test_braces_inside_strings() {
        let response = r#"{"rejectionReason": "blurry } screen \" {", "minutes": null} trailing"#;
        assert_eq!(
            extract_json(response),
            Some(r#"{"rejectionReason": "blurry } screen \" {", "minutes": null}"#)
        );
    }

    #[test]
    fn test_no_object() {
        assert_eq!(extract_json("I could not read the image."), None);
        assert_eq!(extract_json("{\"unterminated\": 1"), None);
    }
}
