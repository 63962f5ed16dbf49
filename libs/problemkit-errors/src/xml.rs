//! `application/problem+xml` rendering (RFC 7807 appendix A).
//!
//! Problem members become child elements of a `<problem>` root in the
//! `urn:ietf:rfc:7807` namespace. Extension members are written as elements
//! named after the member; string values are written as text, other JSON
//! values as their compact JSON text. Validation errors use
//! `<error field="...">` entries so arbitrary field paths stay well-formed.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

use crate::model_state::ModelState;
use crate::problem::{Problem, ValidationProblem};

/// Namespace of the RFC 7807 XML format.
pub const PROBLEM_XML_NS: &str = "urn:ietf:rfc:7807";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("extension member '{0}' is not a valid XML element name")]
    InvalidElementName(String),
    #[error("XML write error: {0}")]
    Write(#[from] quick_xml::Error),
    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Render a problem as an `application/problem+xml` document.
///
/// # Errors
/// Returns `XmlError::InvalidElementName` if an extension member name cannot be
/// used as an element name.
pub fn problem_to_xml(problem: &Problem) -> Result<String, XmlError> {
    let mut writer = start_document("problem", Some(PROBLEM_XML_NS))?;
    write_problem_members(&mut writer, problem)?;
    finish_document(writer, "problem")
}

/// Render a validation problem as an `application/problem+xml` document.
///
/// # Errors
/// Same conditions as [`problem_to_xml`].
pub fn validation_problem_to_xml(problem: &ValidationProblem) -> Result<String, XmlError> {
    let mut writer = start_document("problem", Some(PROBLEM_XML_NS))?;
    write_problem_members(&mut writer, &problem.problem)?;
    writer.write_event(Event::Start(BytesStart::new("errors")))?;
    for (field, messages) in &problem.errors {
        write_field_errors(&mut writer, field, messages)?;
    }
    writer.write_event(Event::End(BytesEnd::new("errors")))?;
    finish_document(writer, "problem")
}

/// Render plain model state as an `application/xml` document.
///
/// # Errors
/// Returns `XmlError` if the underlying writer fails.
pub fn model_state_to_xml(model_state: &ModelState) -> Result<String, XmlError> {
    let mut writer = start_document("errors", None)?;
    for (field, messages) in model_state.iter() {
        write_field_errors(&mut writer, field, messages)?;
    }
    finish_document(writer, "errors")
}

fn start_document(root: &str, namespace: Option<&str>) -> Result<XmlWriter, XmlError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut start = BytesStart::new(root);
    if let Some(ns) = namespace {
        start.push_attribute(("xmlns", ns));
    }
    writer.write_event(Event::Start(start))?;
    Ok(writer)
}

fn finish_document(mut writer: XmlWriter, root: &str) -> Result<String, XmlError> {
    writer.write_event(Event::End(BytesEnd::new(root)))?;
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn write_problem_members(writer: &mut XmlWriter, problem: &Problem) -> Result<(), XmlError> {
    write_text_element(writer, "type", &problem.type_url)?;
    write_text_element(writer, "title", &problem.title)?;
    write_text_element(writer, "status", problem.status.as_str())?;
    if let Some(detail) = &problem.detail {
        write_text_element(writer, "detail", detail)?;
    }
    if let Some(instance) = &problem.instance {
        write_text_element(writer, "instance", instance)?;
    }
    if let Some(trace_id) = &problem.trace_id {
        write_text_element(writer, "trace_id", trace_id)?;
    }
    for (name, value) in &problem.extensions {
        if !is_element_name(name) {
            return Err(XmlError::InvalidElementName(name.clone()));
        }
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        write_text_element(writer, name, &text)?;
    }
    Ok(())
}

fn write_field_errors(
    writer: &mut XmlWriter,
    field: &str,
    messages: &[String],
) -> Result<(), XmlError> {
    for message in messages {
        let mut start = BytesStart::new("error");
        start.push_attribute(("field", field));
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(message)))?;
        writer.write_event(Event::End(BytesEnd::new("error")))?;
    }
    Ok(())
}

fn write_text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// ASCII subset of the XML Name production; reserved `xml*` names excluded.
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if name.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("xml")) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
