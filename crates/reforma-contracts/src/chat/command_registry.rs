#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose argument is a property id or listing URL.
pub(crate) const PROPERTY_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "analyze",
        action: "analyze",
    },
    CommandSpec {
        command: "analizar",
        action: "analyze",
    },
];

/// Commands with an optional directory argument.
pub(crate) const PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "export",
    action: "export",
}];

/// Commands with a floor area argument in m².
pub(crate) const AREA_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "estimate",
    action: "estimate",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "show",
        action: "show",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const SESSION_HELP_COMMANDS: &[&str] = &[
    "/analyze <id|url>",
    "/show",
    "/export [dir]",
    "/estimate <m2>",
    "/help",
    "/quit",
];
