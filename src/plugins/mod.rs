//! Built-in plugins and the registration table the loaders read.

use crate::plugin::PluginDescriptor;

pub mod calendar;
pub mod tasks;

static BUILTIN: [PluginDescriptor; 2] = [
    PluginDescriptor::new(tasks::PLUGIN_ID)
        .with_ui(tasks::ui_provider)
        .with_commands(tasks::commands_provider),
    PluginDescriptor::new(calendar::PLUGIN_ID)
        .with_ui(calendar::ui_provider)
        .with_commands(calendar::commands_provider)
        .with_migrations(calendar::migrations_provider),
];

/// Every plugin compiled into this binary, in sidebar order.
pub fn builtin() -> &'static [PluginDescriptor] {
    &BUILTIN
}
