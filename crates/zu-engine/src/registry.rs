//! Panel registration with the host UI.
//!
//! Host panels list the engines they are compatible with. Registering makes
//! every panel that works with the host's built-in engine show up for this
//! engine too.

use crate::config::EngineInfo;

/// Identifier of the host's built-in engine.
pub const BUILTIN_ENGINE: &str = "BLENDER_RENDER";

/// Host-side table of panel → compatible engine ids.
pub trait PanelRegistry {
    /// Names of the panels that list `engine` as compatible.
    fn panels_for(&self, engine: &str) -> Vec<String>;

    fn add_engine(&mut self, panel: &str, engine: &str);

    fn remove_engine(&mut self, panel: &str, engine: &str);
}

/// Panels touched by [`register`]. Pass it back to
/// [`unregister`](Registration::unregister) to undo exactly those changes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "dropping a Registration leaves the engine registered"]
pub struct Registration {
    engine: String,
    panels: Vec<String>,
}

impl Registration {
    #[inline]
    pub fn engine(&self) -> &str {
        &self.engine
    }

    #[inline]
    pub fn panels(&self) -> &[String] {
        &self.panels
    }

    pub fn unregister(self, registry: &mut dyn PanelRegistry) {
        for panel in &self.panels {
            registry.remove_engine(panel, &self.engine);
        }
        log::debug!(
            "engine '{}' removed from {} panels",
            self.engine,
            self.panels.len()
        );
    }
}

/// Adds `info.id` to every panel compatible with [`BUILTIN_ENGINE`] except
/// those named in `incompatible`.
///
/// Panels that already list the engine are left alone and not recorded.
pub fn register(
    registry: &mut dyn PanelRegistry,
    info: &EngineInfo,
    incompatible: &[&str],
) -> Registration {
    let existing = registry.panels_for(&info.id);
    let panels: Vec<String> = registry
        .panels_for(BUILTIN_ENGINE)
        .into_iter()
        .filter(|panel| !incompatible.contains(&panel.as_str()))
        .filter(|panel| !existing.contains(panel))
        .collect();

    for panel in &panels {
        registry.add_engine(panel, &info.id);
    }
    log::info!("engine '{}' registered on {} panels", info.label, panels.len());

    Registration {
        engine: info.id.clone(),
        panels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::MemoryPanels;

    fn panels() -> MemoryPanels {
        let mut panels = MemoryPanels::default();
        panels.insert("RENDER_PT_dimensions", &[BUILTIN_ENGINE, "CYCLES"]);
        panels.insert("RENDER_PT_format", &[BUILTIN_ENGINE]);
        panels.insert("VIEWLAYER_PT_filter", &[BUILTIN_ENGINE]);
        panels.insert("CYCLES_PT_sampling", &["CYCLES"]);
        panels
    }

    #[test]
    fn registers_on_builtin_compatible_panels() {
        let mut registry = panels();
        let reg = register(&mut registry, &EngineInfo::default(), &[]);

        let mut touched = reg.panels().to_vec();
        touched.sort();
        assert_eq!(
            touched,
            ["RENDER_PT_dimensions", "RENDER_PT_format", "VIEWLAYER_PT_filter"]
        );
        assert!(registry.engines("RENDER_PT_format").contains("ZU"));
        assert!(!registry.engines("CYCLES_PT_sampling").contains("ZU"));
    }

    #[test]
    fn incompatible_panels_are_skipped() {
        let mut registry = panels();
        let reg = register(&mut registry, &EngineInfo::default(), &["VIEWLAYER_PT_filter"]);

        assert_eq!(reg.panels().len(), 2);
        assert!(!registry.engines("VIEWLAYER_PT_filter").contains("ZU"));
    }

    #[test]
    fn unregister_reverts_only_what_register_added() {
        let mut registry = panels();
        registry.insert("RENDER_PT_format", &[BUILTIN_ENGINE, "ZU"]);
        let before = registry.clone();

        let reg = register(&mut registry, &EngineInfo::default(), &[]);
        assert!(!reg.panels().iter().any(|p| p == "RENDER_PT_format"));

        reg.unregister(&mut registry);
        assert_eq!(registry, before);
    }
}
