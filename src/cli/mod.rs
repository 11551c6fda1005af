use crate::constants::{
    APP_DESCRIPTION, APP_NAME, DEFAULT_EXPORT_FONT, DEFAULT_EXPORT_FONT_SIZE,
    DEFAULT_LINE_HEIGHT_MULTIPLE,
};
use crate::export::RenderConfig;
use crate::logging::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// A distraction-free journal backed by plain-text entries
#[derive(Parser, Debug)]
#[clap(name = APP_NAME, about = APP_DESCRIPTION)]
#[clap(author, version, long_about = None)]
pub struct CliArgs {
    /// Log output format
    #[clap(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Log level filter (overridden by RUST_LOG)
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Prints the entry selected at startup (today's entry or a fresh one)
    Today,

    /// Lists entries, most recently modified first
    List {
        /// Print entries as JSON
        #[clap(long)]
        json: bool,

        /// Load a preview of each entry's content
        #[clap(long)]
        previews: bool,
    },

    /// Creates a new entry, optionally with initial text ("-" reads stdin)
    New {
        text: Option<String>,
    },

    /// Appends lines from stdin to an entry, saving as you go
    Write {
        /// Entry to write into (defaults to the entry selected at startup)
        #[clap(short, long)]
        entry: Option<Uuid>,
    },

    /// Prints an entry's content
    Show {
        id: Uuid,
    },

    /// Deletes an entry and its file
    Delete {
        id: Uuid,
    },

    /// Exports an entry as a PDF document
    Export {
        id: Uuid,

        /// Directory to write the document into
        #[clap(short, long)]
        out: Option<PathBuf>,

        /// Font family
        #[clap(long, default_value = DEFAULT_EXPORT_FONT)]
        font: String,

        /// Font size in points
        #[clap(long, default_value_t = DEFAULT_EXPORT_FONT_SIZE)]
        font_size: f32,
    },
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        CliArgs::parse_from(std::env::args())
    }

    /// The subcommand to run; `today` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Today)
    }
}

impl Command {
    /// Render settings for `export`, `None` for every other command.
    pub fn render_config(&self) -> Option<RenderConfig> {
        match self {
            Command::Export {
                font, font_size, ..
            } => Some(RenderConfig {
                font: font.clone(),
                font_size: *font_size,
                line_height_multiple: DEFAULT_LINE_HEIGHT_MULTIPLE,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "4bd46f1e-3c8b-4c8a-9a54-2f3e7f1c2d10";

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(vec!["freewrite"]);
        assert!(args.command.is_none());
        assert_eq!(args.command(), Command::Today);
        assert_eq!(args.log_format, LogFormat::Text);
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_global_logging_flags() {
        let args = CliArgs::parse_from(vec![
            "freewrite",
            "list",
            "--log-format",
            "json",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.log_level.as_deref(), Some("debug"));

        assert!(CliArgs::try_parse_from(vec!["freewrite", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_list_flags() {
        let args = CliArgs::parse_from(vec!["freewrite", "list"]);
        assert_eq!(
            args.command(),
            Command::List {
                json: false,
                previews: false
            }
        );

        let args = CliArgs::parse_from(vec!["freewrite", "list", "--json", "--previews"]);
        assert_eq!(
            args.command(),
            Command::List {
                json: true,
                previews: true
            }
        );
    }

    #[test]
    fn test_new_with_and_without_text() {
        let args = CliArgs::parse_from(vec!["freewrite", "new"]);
        assert_eq!(args.command(), Command::New { text: None });

        let args = CliArgs::parse_from(vec!["freewrite", "new", "first line"]);
        assert_eq!(
            args.command(),
            Command::New {
                text: Some("first line".to_string())
            }
        );
    }

    #[test]
    fn test_entry_ids_are_validated() {
        let args = CliArgs::parse_from(vec!["freewrite", "show", ID]);
        assert_eq!(
            args.command(),
            Command::Show {
                id: Uuid::parse_str(ID).unwrap()
            }
        );

        let args = CliArgs::parse_from(vec!["freewrite", "write", "-e", ID]);
        assert_eq!(
            args.command(),
            Command::Write {
                entry: Some(Uuid::parse_str(ID).unwrap())
            }
        );

        assert!(CliArgs::try_parse_from(vec!["freewrite", "delete", "not-a-uuid"]).is_err());
        assert!(CliArgs::try_parse_from(vec!["freewrite", "show"]).is_err());
    }

    #[test]
    fn test_export_defaults() {
        let args = CliArgs::parse_from(vec!["freewrite", "export", ID]);
        let command = args.command();
        match &command {
            Command::Export {
                out,
                font,
                font_size,
                ..
            } => {
                assert!(out.is_none());
                assert_eq!(font, "Palatino");
                assert_eq!(*font_size, 18.0);
            }
            other => panic!("Expected export, got {:?}", other),
        }
        assert_eq!(command.render_config(), Some(RenderConfig::default()));
    }

    #[test]
    fn test_export_overrides() {
        let args = CliArgs::parse_from(vec![
            "freewrite",
            "export",
            ID,
            "--out",
            "/tmp/out",
            "--font",
            "Courier",
            "--font-size",
            "12",
        ]);
        let config = args.command().render_config().unwrap();
        assert_eq!(config.font, "Courier");
        assert_eq!(config.font_size, 12.0);

        assert!(Command::Today.render_config().is_none());
    }
}
