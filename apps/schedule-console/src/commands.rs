use anyhow::{anyhow, bail, Result};
use regex::Regex;

use schedule_cell::SlotTime;

pub const HELP: &str = "\
Commands:
  prev | next              show the previous / next month
  select <day>             select a day of the displayed month
  toggle <HH:MM>           select or deselect a slot (24-hour)
  add <h>:<mm> <AM|PM>     add a custom time and select it
  save                     save the selected slots for the day
  delete                   delete the whole schedule for the day
  login <token>            store an access token
  logout                   forget the access token
  show                     redraw the calendar
  help                     this text
  quit                     exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PreviousMonth,
    NextMonth,
    Select(u32),
    Toggle(SlotTime),
    Add { hour: u32, minute: u32, meridiem: String },
    Save,
    Delete,
    Login(String),
    Logout,
    Show,
    Help,
    Quit,
}

pub struct CommandParser {
    select: Regex,
    toggle: Regex,
    add: Regex,
    login: Regex,
}

impl CommandParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            select: Regex::new(r"^select\s+(\d{1,2})$")?,
            toggle: Regex::new(r"^toggle\s+(\d{1,2}:\d{2})$")?,
            // Range and meridiem checks happen in the session so they are reported like any other input error.
            add: Regex::new(r"^add\s+(\d{1,2}):(\d{1,2})\s*([A-Za-z]+)$")?,
            login: Regex::new(r"^login\s+(\S+)$")?,
        })
    }

    pub fn parse(&self, line: &str) -> Result<Command> {
        let line = line.trim();

        match line.to_ascii_lowercase().as_str() {
            "prev" | "previous" => return Ok(Command::PreviousMonth),
            "next" => return Ok(Command::NextMonth),
            "save" => return Ok(Command::Save),
            "delete" => return Ok(Command::Delete),
            "logout" => return Ok(Command::Logout),
            "show" => return Ok(Command::Show),
            "help" | "?" => return Ok(Command::Help),
            "quit" | "exit" => return Ok(Command::Quit),
            _ => {}
        }

        if let Some(caps) = self.select.captures(line) {
            return Ok(Command::Select(caps[1].parse()?));
        }

        if let Some(caps) = self.toggle.captures(line) {
            let time: SlotTime = caps[1].parse()?;
            return Ok(Command::Toggle(time));
        }

        if let Some(caps) = self.add.captures(line) {
            return Ok(Command::Add {
                hour: caps[1].parse()?,
                minute: caps[2].parse()?,
                meridiem: caps[3].to_string(),
            });
        }

        if let Some(caps) = self.login.captures(line) {
            return Ok(Command::Login(caps[1].to_string()));
        }

        if line.is_empty() {
            bail!("Empty command");
        }
        Err(anyhow!("Unknown command '{}'. Type 'help' for a list of commands", line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new().unwrap()
    }

    #[test]
    fn test_simple_commands() {
        let parser = parser();
        assert_eq!(parser.parse("prev").unwrap(), Command::PreviousMonth);
        assert_eq!(parser.parse("  NEXT ").unwrap(), Command::NextMonth);
        assert_eq!(parser.parse("save").unwrap(), Command::Save);
        assert_eq!(parser.parse("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_select_and_toggle() {
        let parser = parser();
        assert_eq!(parser.parse("select 10").unwrap(), Command::Select(10));
        assert_eq!(
            parser.parse("toggle 09:30").unwrap(),
            Command::Toggle("09:30".parse().unwrap())
        );
        assert!(parser.parse("toggle 25:00").is_err());
        assert!(parser.parse("select ten").is_err());
    }

    #[test]
    fn test_add_keeps_raw_meridiem() {
        let parser = parser();
        assert_eq!(
            parser.parse("add 9:15 am").unwrap(),
            Command::Add { hour: 9, minute: 15, meridiem: "am".to_string() }
        );
        assert_eq!(
            parser.parse("add 12:05PM").unwrap(),
            Command::Add { hour: 12, minute: 5, meridiem: "PM".to_string() }
        );
    }

    #[test]
    fn test_login_and_unknown() {
        let parser = parser();
        assert_eq!(parser.parse("login abc.def").unwrap(), Command::Login("abc.def".to_string()));
        assert!(parser.parse("book 10:00").is_err());
        assert!(parser.parse("").is_err());
    }
}
