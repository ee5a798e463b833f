//! Flat XML datasets
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <dataset>
//!   <orders id="1" item="pen" note="first"/>
//!   <orders id="2" item="apple"/>
//!   <refunds/>
//! </dataset>
//! ```
//!
//! Each element under `<dataset>` is one row of the table it is named after.
//! A missing attribute is NULL. An element without attributes declares a table
//! with no rows. A row whose cells are all NULL therefore cannot be written.

use dbfixture_common::dataset::render;
use dbfixture_common::{Fixture, Value};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

use crate::error::{FixtureError, FixtureResult};

const ROOT: &str = "dataset";

/// Parse a flat XML dataset
pub fn parse_str(content: &str) -> FixtureResult<Fixture> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut fixture = Fixture::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                element(&mut fixture, &e, depth, &mut seen_root)?;
                depth += 1;
            }
            Event::Empty(e) => element(&mut fixture, &e, depth, &mut seen_root)?,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(FixtureError::Format(format!("missing <{}> root element", ROOT)));
    }
    Ok(fixture)
}

fn element(
    fixture: &mut Fixture,
    e: &BytesStart<'_>,
    depth: usize,
    seen_root: &mut bool,
) -> FixtureResult<()> {
    let qname = e.name();
    let name = utf8(qname.as_ref())?;
    match depth {
        0 if name == ROOT => {
            *seen_root = true;
            Ok(())
        }
        0 => Err(FixtureError::Format(format!(
            "expected <{}> root element, found <{}>",
            ROOT, name
        ))),
        1 => row(fixture, name, e),
        _ => Err(FixtureError::Format(format!(
            "unexpected nested element <{}>",
            name
        ))),
    }
}

fn row(fixture: &mut Fixture, table_name: &str, e: &BytesStart<'_>) -> FixtureResult<()> {
    let table = fixture.table_entry(table_name);

    let mut cells = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let column = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        cells.push((table.ensure_column(column), Value::Text(value)));
    }

    if cells.is_empty() {
        return Ok(());
    }

    let mut values = vec![Value::Null; table.columns().len()];
    for (idx, value) in cells {
        values[idx] = value;
    }
    table.push_row(values)?;
    Ok(())
}

fn utf8(bytes: &[u8]) -> FixtureResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| FixtureError::Format(e.to_string()))
}

/// Serialize a fixture as a flat XML dataset
pub fn to_string(fixture: &Fixture) -> FixtureResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT)))?;

    for table in fixture.tables() {
        if table.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new(table.name())))?;
            continue;
        }
        for values in table.rows() {
            let mut elem = BytesStart::new(table.name());
            for (column, value) in table.columns().iter().zip(values) {
                if let Some(text) = render(value) {
                    elem.push_attribute((column.as_str(), text.as_str()));
                }
            }
            writer.write_event(Event::Empty(elem))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

    String::from_utf8(writer.into_inner()).map_err(|e| FixtureError::Format(e.to_string()))
}

pub fn read_file(path: &Path) -> FixtureResult<Fixture> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Write a fixture, creating parent directories as needed
pub fn write_file(fixture: &Fixture, path: &Path) -> FixtureResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_string(fixture)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbfixture_common::Table;

    #[test]
    fn test_parse_rows_and_nulls() {
        let xml = r#"<?xml version="1.0"?>
<dataset>
  <orders id="1" item="pen"/>
  <orders id="2" note="late &amp; cold"/>
  <refunds/>
</dataset>"#;
        let fixture = parse_str(xml).unwrap();
        assert_eq!(fixture.table_names(), vec!["orders", "refunds"]);

        let orders = fixture.table("orders").unwrap();
        assert_eq!(orders.columns(), &["id".to_string(), "item".to_string(), "note".to_string()]);
        assert_eq!(orders.get(0, "note"), Some(&Value::Null));
        assert_eq!(orders.get(1, "item"), Some(&Value::Null));
        assert_eq!(orders.get(1, "note"), Some(&Value::Text("late & cold".into())));

        let refunds = fixture.table("refunds").unwrap();
        assert!(refunds.is_empty());
        assert!(refunds.columns().is_empty());
    }

    #[test]
    fn test_empty_attribute_is_not_null() {
        let fixture = parse_str(r#"<dataset><ppap text=""/></dataset>"#).unwrap();
        assert_eq!(
            fixture.table("ppap").unwrap().get(0, "text"),
            Some(&Value::Text(String::new()))
        );
    }

    #[test]
    fn test_rejects_wrong_root() {
        let err = parse_str("<rows><orders id=\"1\"/></rows>").unwrap_err();
        assert!(matches!(err, FixtureError::Format(_)));
    }

    #[test]
    fn test_rejects_missing_root() {
        assert!(matches!(parse_str(""), Err(FixtureError::Format(_))));
    }

    #[test]
    fn test_write_then_parse() {
        let mut orders = Table::new("orders", vec!["id".into(), "item".into()]);
        orders
            .push_row(vec![Value::Integer(1), Value::Text("<pen>".into())])
            .unwrap();
        orders.push_row(vec![Value::Integer(2), Value::Null]).unwrap();
        let fixture = Fixture::from_tables(vec![orders, Table::new("refunds", vec![])]);

        let xml = to_string(&fixture).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<refunds/>"));

        let parsed = parse_str(&xml).unwrap();
        let orders = parsed.table("orders").unwrap();
        assert_eq!(orders.get(0, "item"), Some(&Value::Text("<pen>".into())));
        assert_eq!(orders.get(1, "id"), Some(&Value::Text("2".into())));
        assert_eq!(orders.get(1, "item"), Some(&Value::Null));
        assert!(parsed.table("refunds").unwrap().is_empty());
    }
}
