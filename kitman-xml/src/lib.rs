//! Byte-exact XML rendering of a [`Catalog`] (spec §6).

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::fmt::Write;

use kitman_lib::core::generator::Catalog;

/// Render `catalog` as the catalog XML document. The output is byte-exact
/// with the wire format: tab indentation, a blank line between upgrades, and
/// a blank line between comment groups within an upgrade.
pub fn render(catalog: &Catalog) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<upgrades>\n");

    for (index, upgrade) in catalog.upgrades.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "\t<upgrade from=\"{}\" release=\"{}\">",
            escape(&upgrade.from),
            upgrade.is_release
        );

        let mut last_comment: Option<&str> = None;
        for script in &upgrade.scripts {
            if last_comment != Some(script.comment.as_str()) {
                if last_comment.is_some() {
                    out.push('\n');
                }
                let _ = writeln!(out, "\t\t<!-- {} -->", escape(&script.comment));
                last_comment = Some(script.comment.as_str());
            }
            let _ = writeln!(out, "\t\t<script>{}</script>", escape(&script.path));
        }

        out.push_str("\t</upgrade>\n");
    }

    out.push_str("</upgrades>\n");
    out
}

/// Escape the handful of characters XML text/attribute content requires.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitman_lib::core::accumulator::Script;
    use kitman_lib::core::generator::Upgrade;

    fn script(path: &str, comment: &str) -> Script {
        Script {
            path: path.to_string(),
            comment: comment.to_string(),
        }
    }

    /// S1 — linear chain, one source, one upgrade (not a release).
    #[test]
    fn renders_single_upgrade_single_script() {
        let catalog = Catalog {
            upgrades: vec![Upgrade {
                from: "V1".to_string(),
                is_release: false,
                scripts: vec![script("b.sql", "from V2 (ID 2)")],
            }],
        };
        let xml = render(&catalog);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <upgrades>\n\
             \t<upgrade from=\"V1\" release=\"false\">\n\
             \t\t<!-- from V2 (ID 2) -->\n\
             \t\t<script>b.sql</script>\n\
             \t</upgrade>\n\
             </upgrades>\n"
        );
    }

    #[test]
    fn groups_consecutive_scripts_sharing_a_comment() {
        let catalog = Catalog {
            upgrades: vec![Upgrade {
                from: "V1".to_string(),
                is_release: true,
                scripts: vec![
                    script("a.sql", "from V2 (ID 2)"),
                    script("b.sql", "from V2 (ID 2)"),
                    script("c.sql", "from V3 (ID 3), V4 (ID 4)"),
                ],
            }],
        };
        let xml = render(&catalog);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <upgrades>\n\
             \t<upgrade from=\"V1\" release=\"true\">\n\
             \t\t<!-- from V2 (ID 2) -->\n\
             \t\t<script>a.sql</script>\n\
             \t\t<script>b.sql</script>\n\
             \n\
             \t\t<!-- from V3 (ID 3), V4 (ID 4) -->\n\
             \t\t<script>c.sql</script>\n\
             \t</upgrade>\n\
             </upgrades>\n"
        );
    }

    #[test]
    fn separates_multiple_upgrades_with_a_blank_line() {
        let catalog = Catalog {
            upgrades: vec![
                Upgrade {
                    from: "V1".to_string(),
                    is_release: true,
                    scripts: vec![script("a.sql", "from V2 (ID 2)")],
                },
                Upgrade {
                    from: "V2".to_string(),
                    is_release: false,
                    scripts: vec![],
                },
            ],
        };
        let xml = render(&catalog);
        assert!(xml.contains("\t</upgrade>\n\n\t<upgrade from=\"V2\""));
    }

    #[test]
    fn escapes_reserved_xml_characters() {
        let catalog = Catalog {
            upgrades: vec![Upgrade {
                from: "V&1".to_string(),
                is_release: true,
                scripts: vec![],
            }],
        };
        let xml = render(&catalog);
        assert!(xml.contains("from=\"V&amp;1\""));
    }
}
