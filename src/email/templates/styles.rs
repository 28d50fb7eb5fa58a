//! Built-in CSS fragments for the `/* @NAME */` injection points

/// Injection point name -> default CSS fragment
const DEFAULT_CSS: &[(&str, &str)] = &[
    (
        "USER_DEFINED_BODY_CSS",
        r#"
    font-size: 16px;
    color: #333;
    font-family: 'Montserrat', sans-serif;
    "#,
    ),
    (
        "USER_DEFINED_CONTAINER_CSS",
        r#"
    background-color: #f7f5f5;
    max-width: 600px;
    margin: 0 auto;
    padding: 20px;
    display: flex;
    flex-direction: column;
    justify-content: center;
    align-items: flex-start;
  "#,
    ),
    (
        "USER_DEFINED_H1_CSS",
        r#"
    color: #ff0000;
    font-size: 24px;
    font-size: 18px;
    width:100%;
  "#,
    ),
    (
        "USER_DEFINED_P_CSS",
        r#"
    font-size: 16px;
    width:100%;
    "#,
    ),
    (
        "USER_DEFINED_BUTTON_CSS",
        r#"
    width: 150px;
    background-image: linear-gradient(120deg, #84fab0 0%, #8fd3f4 100%);
    color: #ffffff;
    padding: 16px 16px;
    text-decoration: none;
    text-align: center;
    border-radius: 8px;
    font-size: 18px;
    margin-top: 32px;
    font-size: larger;
    font-weight: bolder;
    "#,
    ),
    (
        "USER_DEFINED_NOTE_CSS",
        r#"
    font-size: 14px;
    margin-top: 24px;
    text-align: center;
    color: #888;
    "#,
    ),
];

/// Default fragment for an injection point, if one is built in
pub fn default_css(name: &str) -> Option<&'static str> {
    DEFAULT_CSS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, css)| *css)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_css_lookup() {
        assert!(default_css("USER_DEFINED_BODY_CSS")
            .unwrap()
            .contains("font-family: 'Montserrat'"));
        assert!(default_css("USER_DEFINED_BUTTON_CSS")
            .unwrap()
            .contains("border-radius: 8px"));
        assert!(default_css("USER_DEFINED_FOOTER_CSS").is_none());
        assert!(default_css("").is_none());
    }

    #[test]
    fn test_fragments_match_stylesheet_defaults() {
        assert_eq!(
            default_css("USER_DEFINED_H1_CSS").unwrap(),
            "\n    color: #ff0000;\n    font-size: 24px;\n    font-size: 18px;\n    width:100%;\n  "
        );
        let button = default_css("USER_DEFINED_BUTTON_CSS").unwrap();
        assert!(button.contains("border-radius: 8px;\n    font-size: 18px;\n    margin-top: 32px;"));
        assert!(button.contains("font-size: larger;"));
    }

    #[test]
    fn test_css_marker_names_unique() {
        let mut names: Vec<&str> = DEFAULT_CSS.iter().map(|(name, _)| *name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 6);
    }
}
