//! Documentation comments embedded in a saved preloader configuration.
//!
//! The text is the preloader's own reference documentation and is reproduced
//! verbatim on every save. It is never read back when a file is parsed.

/// Insertion points for documentation comments in the serialized document.
///
/// Variants are listed in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentAnchor {
    /// Before `<OriginalLibrary>`
    OriginalLibrary,
    /// Before `<LoadMethod>`
    LoadMethod,
    /// Before `<LoadMethod>/<ImportAddressHook>`
    ImportAddressHook,
    /// Before `<LoadMethod>/<OnThreadAttach>`
    OnThreadAttach,
    /// Before `<LoadMethod>/<OnProcessAttach>`
    OnProcessAttach,
    /// Before `<InstallExceptionHandler>` and `<KeepExceptionHandler>`
    ExceptionHandler,
    /// Before `<LoadDelay>` and `<HookDelay>`
    Delays,
    /// Before `<Processes>`
    Processes,
}

impl CommentAnchor {
    /// Every anchor, in document order.
    pub const ALL: [CommentAnchor; 8] = [
        CommentAnchor::OriginalLibrary,
        CommentAnchor::LoadMethod,
        CommentAnchor::ImportAddressHook,
        CommentAnchor::OnThreadAttach,
        CommentAnchor::OnProcessAttach,
        CommentAnchor::ExceptionHandler,
        CommentAnchor::Delays,
        CommentAnchor::Processes,
    ];

    /// Comment text written at this anchor.
    pub fn text(self) -> &'static str {
        match self {
            CommentAnchor::OriginalLibrary => ORIGINAL_LIBRARY,
            CommentAnchor::LoadMethod => LOAD_METHOD,
            CommentAnchor::ImportAddressHook => IMPORT_ADDRESS_HOOK,
            CommentAnchor::OnThreadAttach => ON_THREAD_ATTACH,
            CommentAnchor::OnProcessAttach => ON_PROCESS_ATTACH,
            CommentAnchor::ExceptionHandler => EXCEPTION_HANDLER,
            CommentAnchor::Delays => DELAYS,
            CommentAnchor::Processes => PROCESSES,
        }
    }
}

const ORIGINAL_LIBRARY: &str = "
If you have a mod that uses the same DLL as the preloader, you can rename the DLL from your mod and set
its new name here. Empty by default. For example, if the preloader uses 'IpHlpAPI.dll' and your mod uses
the same DLL, rename the DLL from your mod to something else like 'IpHlpAPI MyMod.dll'";

const LOAD_METHOD: &str =
    "Load method for xSE plugins, 'ImportAddressHook' by default. Don't change unless required.";

const IMPORT_ADDRESS_HOOK: &str = "
Sets an import table hook for the specified function inside DLL loaded by the host process.
When the hook is called, it'll load plugins and then it'll get back to its usual operations.

Uses Detours library by Nukem: https://github.com/Nukem9/detours

Remarks:
  Fallout 4:
    LibraryName: MSVCR110.dll
    FunctionName: _initterm_e
    The function *must* have a signature compatible with 'void*(__cdecl*)(void*, void*)'.
  
  Skyrim (Legendary Edition):
    LibraryName: kernel32.dll
    FunctionName: GetCommandLineA
    The function *must* have a signature compatible with 'void*(__stdcall*)()'.

  Skyrim (Special and Anniversary Edition):
    LibraryName: api-ms-win-crt-runtime-l1-1-0.dll
    FunctionName: _initterm_e
    The function *must* have a signature compatible with 'void*(__cdecl*)(void*, void*)'.";

const ON_THREAD_ATTACH: &str = "
Same as 'OnProcessAttach' above, but loads plugins after certain number of threads have been created
by the host process (inside 'DLL_THREAD_ATTACH' notification). This methods has all the disadvantages
of the previous one but it can be triggered too late.

Remarks:
  The method mainly designed for Mod Organizer 2 (MO2) to give some time to its virtual file system to
  initialize itself, otherwise there will be no plugins to preload if they're installed as MO2 virtual
  mods.";

const ON_PROCESS_ATTACH: &str = "
Loads plugins inside 'DLLMain' of the preloader DLL when it receives 'DLL_PROCESS_ATTACH' notification.
In other words, right after the host process starts. Executing certain kinds of code inside 'DLLMain' is
risky (see: https://docs.microsoft.com/ru-ru/windows/win32/dlls/dynamic-link-library-best-practices#general-best-practices)
so this method may fail in some cases.

Remarks:
  The preloader calls 'DisableThreadLibraryCalls' when it's done interfacing with 'DLLMain' thread notifications.";

const EXCEPTION_HANDLER: &str = "Usually vectored exception handler is installed right before plugins loading and removed after it's done.

Allows you to keep the exception handler if you need more information in case the host process crashes.";

const DELAYS: &str = "
Sets the amount of time the preloader will pause the loading thread, in milliseconds. 0 means no delay.
Don't change unless you need some time to attach debugger before loading starts, for example.

HookDelay works only for 'ImportAddressHook' methods and additionally waits before hooking the required function.";

const PROCESSES: &str = "
This block defines a list of processes which are allowed to preload plugins. Only processes in this list
with the attribute 'Allow' set to 'true' will be allowed to preload. Name comparison is *not* case-sensitive.";
