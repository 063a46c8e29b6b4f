//! Manufacturer decoder modules and their registry.
//!
//! Each manufacturer with a device-specific dialect gets one module instance,
//! constructed on first use and kept for the life of the registry so that
//! session state (selected device id, identified variant) carries across
//! messages.

use std::collections::HashMap;

use log::debug;

/// What a module produced for one line of command text: an optional frame to
/// hand to the transport, and an optional report for the user. Both empty
/// means the module did not recognize the command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub frame: Option<Vec<u8>>,
    pub report: Option<String>,
}

impl CommandReply {
    pub fn report(text: impl Into<String>) -> Self {
        CommandReply {
            frame: None,
            report: Some(text.into()),
        }
    }

    pub fn send(frame: Vec<u8>, report: Option<String>) -> Self {
        CommandReply {
            frame: Some(frame),
            report,
        }
    }
}

/// A manufacturer-specific SysEx codec.
pub trait SysexModule {
    /// Called with the fields of a universal identity reply whose
    /// manufacturer resolved to this module.
    fn identity(&mut self, id: u16, family: u16, product: u16, version: u32);

    /// Appends a decode of a manufacturer-specific message to `out`.
    /// `offset` indexes into `message` just past the manufacturer identifier.
    /// A buffer that runs out mid-field truncates the text, never fails.
    fn decode(&mut self, message: &[u8], offset: usize, out: &mut String);

    /// Translates one line of command text into a reply.
    fn command(&mut self, line: &str) -> CommandReply;

    /// Command syntax templates, for help display.
    fn commands(&self) -> &'static [&'static str];
}

type ModuleFactory = fn() -> Box<dyn SysexModule>;

/// The closed set of module constructors, keyed by manufacturer name as it
/// appears in the manufacturer table.
const MODULE_FACTORIES: &[(&str, ModuleFactory)] = &[("AkaiPro", crate::dps::module)];

/// Owns the module instances. Resolution is lazy and idempotent: the first
/// request for a name constructs the module, later requests return the same
/// instance.
pub struct ModuleRegistry {
    modules: HashMap<&'static str, Box<dyn SysexModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry {
            modules: HashMap::new(),
        }
    }

    /// Resolves a manufacturer name to its module, constructing and caching
    /// it on first use. `None` if no module is registered for the name.
    pub fn resolve(&mut self, name: &str) -> Option<&mut dyn SysexModule> {
        let &(key, factory) = MODULE_FACTORIES.iter().find(|(key, _)| *key == name)?;
        let module = self.modules.entry(key).or_insert_with(|| {
            debug!("constructing module for {}", key);
            factory()
        });
        Some(module.as_mut())
    }

    /// The modules constructed so far, in no particular order.
    pub fn loaded(&self) -> impl Iterator<Item = (&'static str, &dyn SysexModule)> + '_ {
        self.modules.iter().map(|(name, module)| (*name, module.as_ref()))
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_unknown_name() {
        let mut registry = ModuleRegistry::new();
        assert!(registry.resolve("Yamaha").is_none());
        assert!(registry.resolve("NoSuchVendor").is_none());
    }

    #[test]
    fn resolve_caches_one_instance() {
        let mut registry = ModuleRegistry::new();

        // State set through the first resolution must be visible through the
        // second one.
        let reply = registry.resolve("AkaiPro").unwrap().command("dev 5");
        assert_eq!(reply.report.as_deref(), Some("Device: 5"));

        let reply = registry.resolve("AkaiPro").unwrap().command("lock keys");
        let frame = reply.frame.unwrap();
        assert_eq!(frame[1], 5);
        assert_eq!(registry.loaded().count(), 1);
    }

    #[test]
    fn modules_list_their_commands() {
        let mut registry = ModuleRegistry::new();
        let commands = registry.resolve("AkaiPro").unwrap().commands();
        assert!(commands.iter().any(|c| c.starts_with("mix")));
    }
}
