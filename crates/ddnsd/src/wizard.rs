// First-run setup wizard for the file variant.
//
// Reads answers line by line from any `BufRead` and writes prompts to any
// `Write`, so the daemon passes stdin/stdout and tests pass byte buffers.
// Running out of input is an error instead of an endless re-prompt.

use ddns_core::config::{
    DdnsConfig, DomainList, GlobalSettings, IpVersion, NotificationSettings, PLACEHOLDER_TOKEN,
};
use std::io::{self, BufRead, Write};

const DEFAULT_DOMAIN: &str = "example.dns.navy";
const DEFAULT_INTERVAL_SECS: u64 = 300;
const DEFAULT_INTERFACE: &str = "wlan0";
const DEFAULT_IP_TYPE: IpVersion = IpVersion::V6;

pub struct Wizard<R, W> {
    input: R,
    output: W,
    /// Every interface name the system knows; empty disables the existence check
    known_interfaces: Vec<String>,
    /// Up, non-loopback interfaces shown as suggestions
    suggested_interfaces: Vec<String>,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    pub fn new(
        input: R,
        output: W,
        known_interfaces: Vec<String>,
        suggested_interfaces: Vec<String>,
    ) -> Self {
        Self {
            input,
            output,
            known_interfaces,
            suggested_interfaces,
        }
    }

    /// Ask every question and build the record
    ///
    /// The result is not validated; a skipped token yields the placeholder.
    pub fn run(&mut self) -> io::Result<DdnsConfig> {
        let domains = self.ask_domains()?;

        writeln!(self.output, "\nEnter your dynv6 token (Zones page on dynv6.com)")?;
        writeln!(self.output, "- press Enter to keep {} and edit the file later", PLACEHOLDER_TOKEN)?;
        let token = self.read_answer()?;
        let token = if token.is_empty() {
            PLACEHOLDER_TOKEN.to_string()
        } else {
            token
        };

        let interval = self.ask_interval()?;
        let interface = self.ask_interface()?;
        let ip_type = self.ask_ip_type()?;

        writeln!(self.output, "\nTelegram bot token (optional, Enter to disable notifications)")?;
        let telegram_bot_token = self.read_answer()?;
        writeln!(self.output, "\nTelegram chat ID (optional, Enter to disable notifications)")?;
        let telegram_chat_id = self.read_answer()?;

        Ok(DdnsConfig {
            global_settings: GlobalSettings {
                update_interval_seconds: interval,
                network_interface: interface,
                ip_type,
            },
            domain_list: DomainList { domains, token },
            notification_settings: NotificationSettings {
                telegram_bot_token,
                telegram_chat_id,
            },
        })
    }

    fn ask_domains(&mut self) -> io::Result<Vec<String>> {
        writeln!(self.output, "Enter your dynv6 hostnames, comma separated (e.g. example.dns.navy,test.dns.navy)")?;
        writeln!(self.output, "- press Enter to use {}", DEFAULT_DOMAIN)?;
        loop {
            let answer = self.read_answer()?;
            if answer.is_empty() {
                return Ok(vec![DEFAULT_DOMAIN.to_string()]);
            }
            let domains: Vec<String> = answer
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
            if !domains.is_empty() {
                return Ok(domains);
            }
            writeln!(self.output, "Error: hostnames cannot be empty, try again")?;
        }
    }

    fn ask_interval(&mut self) -> io::Result<u64> {
        writeln!(self.output, "\nUpdate interval in seconds (300 recommended)")?;
        writeln!(self.output, "- press Enter to use {}", DEFAULT_INTERVAL_SECS)?;
        loop {
            let answer = self.read_answer()?;
            if answer.is_empty() {
                return Ok(DEFAULT_INTERVAL_SECS);
            }
            match answer.parse::<u64>() {
                Ok(secs) if secs > 0 => return Ok(secs),
                _ => writeln!(self.output, "Error: the interval must be a positive integer, try again")?,
            }
        }
    }

    fn ask_interface(&mut self) -> io::Result<String> {
        writeln!(self.output, "\nNetwork interface to read addresses from")?;
        if self.suggested_interfaces.is_empty() {
            writeln!(self.output, "- e.g. wlan0, rmnet0")?;
        } else {
            writeln!(self.output, "- available: {}", self.suggested_interfaces.join(", "))?;
        }
        writeln!(self.output, "- press Enter to use {}", DEFAULT_INTERFACE)?;
        loop {
            let answer = self.read_answer()?;
            let name = if answer.is_empty() {
                DEFAULT_INTERFACE.to_string()
            } else {
                answer
            };
            if self.known_interfaces.is_empty() || self.known_interfaces.contains(&name) {
                return Ok(name);
            }
            writeln!(self.output, "Error: interface {} does not exist, try again", name)?;
            if !self.suggested_interfaces.is_empty() {
                writeln!(self.output, "- available: {}", self.suggested_interfaces.join(", "))?;
            }
        }
    }

    fn ask_ip_type(&mut self) -> io::Result<IpVersion> {
        writeln!(self.output, "\nIP type: ipv4, ipv6 or dual")?;
        writeln!(self.output, "- press Enter to use {}", DEFAULT_IP_TYPE)?;
        loop {
            let answer = self.read_answer()?;
            if answer.is_empty() {
                return Ok(DEFAULT_IP_TYPE);
            }
            match answer.parse() {
                Ok(mode) => return Ok(mode),
                Err(_) => writeln!(self.output, "Error: the IP type must be ipv4, ipv6 or dual, try again")?,
            }
        }
    }

    fn read_answer(&mut self) -> io::Result<String> {
        write!(self.output, "> ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before setup finished",
            ));
        }
        Ok(line.trim().to_string())
    }
}
