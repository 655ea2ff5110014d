//! Command plugins. Each module registers its specs into the shared registry.

pub mod admin;
pub mod antilink;
pub mod greetings;
pub mod help;
pub mod lists;
pub mod locks;
pub mod points;
pub mod quiz;
pub mod rules;
pub mod warn;

use crate::bot::dispatcher::CommandRegistry;

/// Build the full command registry.
pub fn register_all() -> CommandRegistry {
    let mut reg = CommandRegistry::new();
    help::register(&mut reg);
    warn::register(&mut reg);
    antilink::register(&mut reg);
    admin::register(&mut reg);
    locks::register(&mut reg);
    lists::register(&mut reg);
    rules::register(&mut reg);
    greetings::register(&mut reg);
    points::register(&mut reg);
    quiz::register(&mut reg);
    reg
}
