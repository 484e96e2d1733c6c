//! Integration tests for the PluginPreloader XML mapping
//!
//! These tests verify:
//! - Parse → serialize → parse preserves every field
//! - Missing elements fall back to defaults
//! - Unrecognized documents yield an unloaded default config
//! - The process catalog never grows or shrinks
//! - Strict coercion and malformed input errors

use preloader_configurator::models::PROCESS_CATALOG;
use preloader_configurator::{ConfigXmlError, PreloaderConfig};
use proptest::prelude::*;

const SAMPLE_DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xSE>
	<PluginPreloader>
		<OriginalLibrary>winhttp_original.dll</OriginalLibrary>
		<LoadMethod Name="OnThreadAttach">
			<ImportAddressHook>
				<LibraryName>kernel32.dll</LibraryName>
				<FunctionName>GetCommandLineA</FunctionName>
			</ImportAddressHook>
			<OnThreadAttach>
				<ThreadNumber>3</ThreadNumber>
			</OnThreadAttach>
			<OnProcessAttach />
		</LoadMethod>
		<InstallExceptionHandler>false</InstallExceptionHandler>
		<KeepExceptionHandler>true</KeepExceptionHandler>
		<LoadDelay>250</LoadDelay>
		<HookDelay>-10</HookDelay>
		<Processes>
			<Item Name="fallout3.exe" Allow="TRUE" />
			<Item Name="SkyrimSE.exe" Allow="false" />
			<Item Name="Starfield.exe" Allow="true" />
		</Processes>
	</PluginPreloader>
</xSE>"#;

fn allowed(config: &PreloaderConfig, name: &str) -> bool {
    config.process(name).expect("process in catalog").allowed
}

#[test]
fn test_parse_sample_document() {
    let config = PreloaderConfig::from_xml(SAMPLE_DOCUMENT).unwrap();

    assert!(config.is_loaded());
    assert_eq!(config.original_library, "winhttp_original.dll");
    assert_eq!(config.load_method, "OnThreadAttach");
    assert_eq!(config.import_library, "kernel32.dll");
    assert_eq!(config.import_function, "GetCommandLineA");
    assert_eq!(config.thread_number, "3");
    assert!(!config.install_exception_handler);
    assert!(config.keep_exception_handler);
    assert_eq!(config.load_delay, 250);
    assert_eq!(config.hook_delay, -10);

    assert!(allowed(&config, "Fallout3.exe"));
    assert!(!allowed(&config, "SkyrimSE.exe"));
    // Untouched entries keep their catalog defaults
    assert!(allowed(&config, "Fallout4.exe"));
    assert!(!allowed(&config, "Oblivion.exe"));
}

#[test]
fn test_round_trip_sample_document() {
    let first = PreloaderConfig::from_xml(SAMPLE_DOCUMENT).unwrap();
    let xml = first.save_to_xml().unwrap();
    let second = PreloaderConfig::from_xml(&xml).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_round_trip_through_bytes_with_bom() {
    let first = PreloaderConfig::from_xml(SAMPLE_DOCUMENT).unwrap();
    let bytes = first.to_xml_bytes().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with('\u{feff}'));

    let second = PreloaderConfig::from_xml(&text).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_default_fill() {
    let config = PreloaderConfig::from_xml("<xSE><PluginPreloader/></xSE>").unwrap();

    assert!(config.is_loaded());
    assert!(config.same_settings(&PreloaderConfig::default()));
}

#[test]
fn test_unrecognized_documents_are_unloaded_defaults() {
    for xml in [
        "<Config><PluginPreloader/></Config>",
        "<xSE><Preloader/></xSE>",
        "<xSE/>",
    ] {
        let config = PreloaderConfig::from_xml(xml).unwrap();
        assert!(!config.is_loaded(), "{xml} should not be recognized");
        assert_eq!(config, PreloaderConfig::default());
    }
}

#[test]
fn test_catalog_invariance() {
    let config = PreloaderConfig::from_xml(SAMPLE_DOCUMENT).unwrap();

    let names: Vec<&str> = config.processes().iter().map(|p| p.name()).collect();
    let catalog: Vec<&str> = PROCESS_CATALOG.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, catalog);
    assert!(config.process("Starfield.exe").is_none());
}

#[test]
fn test_strict_coercion_errors() {
    let result = PreloaderConfig::from_xml(
        "<xSE><PluginPreloader><InstallExceptionHandler>maybe</InstallExceptionHandler></PluginPreloader></xSE>",
    );
    assert!(matches!(result, Err(ConfigXmlError::TypeCoercion { .. })));

    let result = PreloaderConfig::from_xml(
        "<xSE><PluginPreloader><LoadDelay>abc</LoadDelay></PluginPreloader></xSE>",
    );
    assert!(matches!(result, Err(ConfigXmlError::TypeCoercion { .. })));

    let result = PreloaderConfig::from_xml(
        r#"<xSE><PluginPreloader><Processes><Item Name="TESV.exe" Allow="yes"/></Processes></PluginPreloader></xSE>"#,
    );
    assert!(matches!(result, Err(ConfigXmlError::TypeCoercion { .. })));
}

#[test]
fn test_malformed_xml() {
    let result = PreloaderConfig::from_xml("<xSE><PluginPreloader>");
    assert!(matches!(result, Err(ConfigXmlError::MalformedInput { .. })));
}

#[test]
fn test_edit_serialize_reparse_scenario() {
    let mut config = PreloaderConfig::new();
    config.load_delay = 500;
    assert!(config.set_process_allowed("Fallout3.exe", true));

    let xml = config.save_to_xml().unwrap();
    let reparsed = PreloaderConfig::from_xml(&xml).unwrap();

    assert_eq!(reparsed.load_delay, 500);
    assert!(allowed(&reparsed, "Fallout3.exe"));

    let defaults = PreloaderConfig::default();
    assert_eq!(reparsed.load_method, defaults.load_method);
    assert_eq!(reparsed.original_library, defaults.original_library);
    assert_eq!(reparsed.import_library, "MSVCR110.dll");
    assert_eq!(reparsed.import_function, "_initterm_e");
    assert_eq!(reparsed.thread_number, "2");
    assert!(reparsed.install_exception_handler);
    assert!(!reparsed.keep_exception_handler);
    assert_eq!(reparsed.hook_delay, 0);
    for ((name, default_allowed), entry) in PROCESS_CATALOG.iter().zip(reparsed.processes()) {
        assert_eq!(entry.name(), *name);
        if *name != "Fallout3.exe" {
            assert_eq!(entry.allowed, *default_allowed, "{name}");
        }
    }
}

/// Text that survives a round trip: empty, or starting with a visible character
fn text_value() -> impl Strategy<Value = String> {
    "([A-Za-z0-9_.<>&][A-Za-z0-9_.<>&\"' -]{0,20})?"
}

prop_compose! {
    fn arb_config()(
        load_method in text_value(),
        original_library in text_value(),
        import_library in text_value(),
        import_function in text_value(),
        thread_number in text_value(),
        install_exception_handler in any::<bool>(),
        keep_exception_handler in any::<bool>(),
        load_delay in any::<i32>(),
        hook_delay in any::<i32>(),
        flags in proptest::collection::vec(any::<bool>(), PROCESS_CATALOG.len()),
    ) -> PreloaderConfig {
        let mut config = PreloaderConfig::new();
        config.load_method = load_method;
        config.original_library = original_library;
        config.import_library = import_library;
        config.import_function = import_function;
        config.thread_number = thread_number;
        config.install_exception_handler = install_exception_handler;
        config.keep_exception_handler = keep_exception_handler;
        config.load_delay = load_delay;
        config.hook_delay = hook_delay;
        for ((name, _), allowed) in PROCESS_CATALOG.iter().zip(flags) {
            config.set_process_allowed(name, allowed);
        }
        config
    }
}

proptest! {
    #[test]
    fn prop_serialize_then_parse_preserves_fields(config in arb_config()) {
        let xml = config.save_to_xml().unwrap();
        let parsed = PreloaderConfig::from_xml(&xml).unwrap();

        prop_assert!(parsed.is_loaded());
        prop_assert!(parsed.same_settings(&config), "{:?} != {:?}", parsed, config);

        // Second pass is byte-identical
        prop_assert_eq!(parsed.save_to_xml().unwrap(), xml);
    }
}
