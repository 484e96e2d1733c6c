use super::ConfigXmlError;
use super::names;
use crate::models::{CommentAnchor, PreloaderConfig};
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Byte order mark prepended to documents written to disk
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

type XmlWriter = Writer<Vec<u8>>;

fn serialization<E>(error: E) -> ConfigXmlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ConfigXmlError::Serialization(Box::new(error))
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), ConfigXmlError> {
    writer.write_event(event).map_err(serialization)
}

fn start(writer: &mut XmlWriter, name: &str) -> Result<(), ConfigXmlError> {
    write(writer, Event::Start(BytesStart::new(name)))
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), ConfigXmlError> {
    write(writer, Event::End(BytesEnd::new(name)))
}

fn comment(writer: &mut XmlWriter, anchor: CommentAnchor) -> Result<(), ConfigXmlError> {
    write(writer, Event::Comment(BytesText::from_escaped(anchor.text())))
}

/// `<name>value</name>` on one line, including when `value` is empty
fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> Result<(), ConfigXmlError> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(value))
        .map_err(serialization)?;
    Ok(())
}

/// Self-closing tag with a space before `/>`, e.g. `<Item Name="x" Allow="true" />`
fn empty_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
) -> Result<(), ConfigXmlError> {
    let mut content = String::from(name);
    for (key, value) in attributes {
        content.push(' ');
        content.push_str(key);
        content.push_str("=\"");
        content.push_str(&escape(*value));
        content.push('"');
    }
    content.push(' ');
    write(writer, Event::Empty(BytesStart::from_content(content, name.len())))
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Serialize a config to the full document text.
///
/// The output is deterministic: fixed element order, tab indentation, `\n`
/// line endings, an `<?xml version="1.0" encoding="utf-8"?>` declaration and
/// the documentation comment for every section. Both `ImportAddressHook` and
/// `OnThreadAttach` are always written; only `LoadMethod/@Name` selects one.
///
/// The returned string has no byte order mark; see
/// [`PreloaderConfig::to_xml_bytes`] for the on-disk form.
pub fn write_config(config: &PreloaderConfig) -> Result<String, ConfigXmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    start(&mut writer, names::ROOT)?;
    start(&mut writer, names::PRELOADER)?;

    comment(&mut writer, CommentAnchor::OriginalLibrary)?;
    text_element(&mut writer, names::ORIGINAL_LIBRARY, &config.original_library)?;

    comment(&mut writer, CommentAnchor::LoadMethod)?;
    let load_method = BytesStart::new(names::LOAD_METHOD)
        .with_attributes([(names::NAME, config.load_method.as_str())]);
    write(&mut writer, Event::Start(load_method))?;

    comment(&mut writer, CommentAnchor::ImportAddressHook)?;
    start(&mut writer, names::IMPORT_ADDRESS_HOOK)?;
    text_element(&mut writer, names::LIBRARY_NAME, &config.import_library)?;
    text_element(&mut writer, names::FUNCTION_NAME, &config.import_function)?;
    end(&mut writer, names::IMPORT_ADDRESS_HOOK)?;

    comment(&mut writer, CommentAnchor::OnThreadAttach)?;
    start(&mut writer, names::ON_THREAD_ATTACH)?;
    text_element(&mut writer, names::THREAD_NUMBER, &config.thread_number)?;
    end(&mut writer, names::ON_THREAD_ATTACH)?;

    comment(&mut writer, CommentAnchor::OnProcessAttach)?;
    empty_element(&mut writer, names::ON_PROCESS_ATTACH, &[])?;
    end(&mut writer, names::LOAD_METHOD)?;

    comment(&mut writer, CommentAnchor::ExceptionHandler)?;
    text_element(
        &mut writer,
        names::INSTALL_EXCEPTION_HANDLER,
        bool_text(config.install_exception_handler),
    )?;
    text_element(
        &mut writer,
        names::KEEP_EXCEPTION_HANDLER,
        bool_text(config.keep_exception_handler),
    )?;

    comment(&mut writer, CommentAnchor::Delays)?;
    text_element(&mut writer, names::LOAD_DELAY, &config.load_delay.to_string())?;
    text_element(&mut writer, names::HOOK_DELAY, &config.hook_delay.to_string())?;

    comment(&mut writer, CommentAnchor::Processes)?;
    start(&mut writer, names::PROCESSES)?;
    for process in config.processes() {
        empty_element(
            &mut writer,
            names::ITEM,
            &[
                (names::NAME, process.name()),
                (names::ALLOW, bool_text(process.allowed)),
            ],
        )?;
    }
    end(&mut writer, names::PROCESSES)?;

    end(&mut writer, names::PRELOADER)?;
    end(&mut writer, names::ROOT)?;

    String::from_utf8(writer.into_inner()).map_err(serialization)
}
