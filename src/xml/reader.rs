use super::ConfigXmlError;
use super::dom::{self, Element};
use super::names;
use crate::models::PreloaderConfig;
use crate::models::preloader::{
    DEFAULT_IMPORT_FUNCTION, DEFAULT_IMPORT_LIBRARY, DEFAULT_LOAD_METHOD, DEFAULT_THREAD_NUMBER,
};

/// Parse a configuration document into a new [`PreloaderConfig`].
///
/// Lookup rules:
/// - the document must be `xSE/PluginPreloader`, otherwise the defaults are
///   returned unloaded
/// - a missing element or attribute falls back to its default
/// - `LibraryName`/`FunctionName` and `ThreadNumber` are only read when their
///   `ImportAddressHook`/`OnThreadAttach` parent exists
/// - process flags are applied by walking the fixed catalog and searching the
///   document for each name, so unknown `<Item>`s never extend the list
///
/// # Errors
///
/// - [`ConfigXmlError::MalformedInput`] if the text is not well-formed XML
/// - [`ConfigXmlError::TypeCoercion`] if a boolean or integer value does not parse
pub fn parse_config(xml_content: &str) -> Result<PreloaderConfig, ConfigXmlError> {
    let xml_content = xml_content.strip_prefix('\u{feff}').unwrap_or(xml_content);
    let document = dom::parse(xml_content)?;

    let mut config = PreloaderConfig::default();

    let preloader = match document.name() {
        names::ROOT => document.child(names::PRELOADER),
        _ => None,
    };
    let Some(preloader) = preloader else {
        return Ok(config);
    };

    config.original_library = child_text(preloader, names::ORIGINAL_LIBRARY).unwrap_or_default();

    let load_method = preloader.child(names::LOAD_METHOD);
    config.load_method = load_method
        .and_then(|element| element.attribute(names::NAME))
        .unwrap_or(DEFAULT_LOAD_METHOD)
        .to_string();

    if let Some(hook) = load_method.and_then(|element| element.child(names::IMPORT_ADDRESS_HOOK)) {
        config.import_library = child_text(hook, names::LIBRARY_NAME)
            .unwrap_or_else(|| DEFAULT_IMPORT_LIBRARY.to_string());
        config.import_function = child_text(hook, names::FUNCTION_NAME)
            .unwrap_or_else(|| DEFAULT_IMPORT_FUNCTION.to_string());
    }

    if let Some(thread_attach) =
        load_method.and_then(|element| element.child(names::ON_THREAD_ATTACH))
    {
        config.thread_number = child_text(thread_attach, names::THREAD_NUMBER)
            .unwrap_or_else(|| DEFAULT_THREAD_NUMBER.to_string());
    }

    config.install_exception_handler = parse_bool(
        names::INSTALL_EXCEPTION_HANDLER,
        child_text(preloader, names::INSTALL_EXCEPTION_HANDLER).as_deref(),
        "true",
    )?;
    config.keep_exception_handler = parse_bool(
        names::KEEP_EXCEPTION_HANDLER,
        child_text(preloader, names::KEEP_EXCEPTION_HANDLER).as_deref(),
        "false",
    )?;
    config.load_delay = parse_int(
        names::LOAD_DELAY,
        child_text(preloader, names::LOAD_DELAY).as_deref(),
        "0",
    )?;
    config.hook_delay = parse_int(
        names::HOOK_DELAY,
        child_text(preloader, names::HOOK_DELAY).as_deref(),
        "0",
    )?;

    if let Some(processes) = preloader.child(names::PROCESSES) {
        apply_process_flags(&mut config, processes)?;
    }

    config.mark_loaded();
    Ok(config)
}

fn child_text(parent: &Element, name: &str) -> Option<String> {
    parent.child(name).map(Element::text)
}

fn apply_process_flags(
    config: &mut PreloaderConfig,
    processes: &Element,
) -> Result<(), ConfigXmlError> {
    let names_in_catalog: Vec<String> =
        config.processes().iter().map(|p| p.name().to_string()).collect();

    for name in names_in_catalog {
        let item = processes.children_named(names::ITEM).find(|item| {
            item.attribute(names::NAME)
                .is_some_and(|value| value.eq_ignore_ascii_case(&name))
        });

        if let Some(item) = item {
            let field = format!("Processes/Item[{}]/@Allow", name);
            let allowed = parse_bool(&field, item.attribute(names::ALLOW), "false")?;
            config.set_process_allowed(&name, allowed);
        }
    }

    Ok(())
}

/// Strict boolean: `true`/`false` in any ASCII case, surrounding whitespace ignored
fn parse_bool(field: &str, text: Option<&str>, default: &str) -> Result<bool, ConfigXmlError> {
    let text = text.unwrap_or(default);
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(coercion_error(field, text))
    }
}

/// Strict 32-bit integer, optional sign, surrounding whitespace ignored
fn parse_int(field: &str, text: Option<&str>, default: &str) -> Result<i32, ConfigXmlError> {
    let text = text.unwrap_or(default);
    text.trim()
        .parse::<i32>()
        .map_err(|_| coercion_error(field, text))
}

fn coercion_error(field: &str, text: &str) -> ConfigXmlError {
    ConfigXmlError::TypeCoercion {
        field: field.to_string(),
        text: text.to_string(),
    }
}
