//! Parser for the circuit description language.
//!
//! The parser drives the scanner one symbol at a time and builds the circuit
//! directly into the [`Network`] and [`Monitors`] it is given. It never stops
//! at the first problem: each error is recorded as a [`Diagnostic`](crate::error::Diagnostic), the
//! parser skips ahead to a synchronising symbol and carries on.

use log::debug;
use thiserror::Error;

use super::keywords::{Heading, Keyword};
use super::scanner::{NameMode, Scanner, Symbol, SymbolKind};
use crate::circuit::{devices_without_inputs, DeviceId, DeviceKind, PortRef, Signal};
use crate::error::{DiagnosticKind, Diagnostics};
use crate::names::{NameId, Names};
use crate::simulator::{ConnectionError, MonitorError, Monitors, Network};
use crate::{MAX_INPUTS, MAX_RANGE_LEN};

/// Symbols the parser can resynchronise on after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Semicolon,
    CloseBrace,
    Heading,
    Eof,
}

impl Anchor {
    fn matches(&self, kind: SymbolKind) -> bool {
        match self {
            Self::Semicolon => kind == SymbolKind::Semicolon,
            Self::CloseBrace => kind == SymbolKind::CloseBrace,
            Self::Heading => matches!(kind, SymbolKind::Heading(_)),
            Self::Eof => kind == SymbolKind::Eof,
        }
    }
}

const STATEMENT_END: &[Anchor] = &[Anchor::Semicolon, Anchor::CloseBrace, Anchor::Heading, Anchor::Eof];

const INIT_ONLY: &str = "only 'set' and 'has cycle' statements are allowed in the 'init' section";

/// Why `A1 => A4` style range notation was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("name '{0}' has no numeric suffix")]
    MissingSuffix(String),
    #[error("numeric suffix of '{0}' is too large")]
    SuffixTooLarge(String),
    #[error("name bases are inconsistent, '{0}' and '{1}'")]
    InconsistentBases(String, String),
    #[error("incorrect order of range values, {0} > {1}")]
    Descending(u32, u32),
    #[error("range of {len} names exceeds the limit of {limit}")]
    TooLong { len: u64, limit: usize },
}

impl RangeError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Descending(..) => DiagnosticKind::Value,
            Self::TooLong { .. } => DiagnosticKind::Semantic,
            _ => DiagnosticKind::Syntax,
        }
    }
}

/// Expand `first => last` into every name from `first` to `last`.
///
/// Both names must share a base and end in a number; the result counts
/// from the lower suffix to the higher one inclusive, and holds at most
/// [`MAX_RANGE_LEN`] names.
pub fn expand_range(first: &str, last: &str) -> std::result::Result<Vec<String>, RangeError> {
    let (base, low) = split_suffix(first)?;
    let (other, high) = split_suffix(last)?;
    if base != other {
        return Err(RangeError::InconsistentBases(base.to_string(), other.to_string()));
    }
    if low > high {
        return Err(RangeError::Descending(low, high));
    }
    let len = u64::from(high - low) + 1;
    if len > MAX_RANGE_LEN as u64 {
        return Err(RangeError::TooLong {
            len,
            limit: MAX_RANGE_LEN,
        });
    }
    Ok((low..=high).map(|n| format!("{}{}", base, n)).collect())
}

fn split_suffix(name: &str) -> std::result::Result<(&str, u32), RangeError> {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[base.len()..];
    if digits.is_empty() {
        return Err(RangeError::MissingSuffix(name.to_string()));
    }
    let value = digits
        .parse()
        .map_err(|_| RangeError::SuffixTooLarge(name.to_string()))?;
    Ok((base, value))
}

/// An error that has already been recorded.
struct Reported;

type Step<T> = std::result::Result<T, Reported>;

/// Recursive-descent parser that builds a circuit while it reads it.
pub struct Parser<'a> {
    names: &'a mut Names,
    network: &'a mut Network,
    monitors: &'a mut Monitors,
    scanner: Scanner,
    current: Symbol,
    mode: NameMode,
    seen: Vec<Heading>,
    diagnostics: Diagnostics,
}

impl<'a> Parser<'a> {
    /// Create a parser and read the first symbol.
    pub fn new(
        names: &'a mut Names,
        network: &'a mut Network,
        monitors: &'a mut Monitors,
        scanner: Scanner,
    ) -> Self {
        let mut parser = Self {
            names,
            network,
            monitors,
            scanner,
            current: Symbol {
                kind: SymbolKind::Eof,
                text: String::new(),
                line: 1,
                column: 1,
            },
            mode: NameMode::Declare,
            seen: Vec::new(),
            diagnostics: Diagnostics::new(),
        };
        parser.advance();
        parser
    }

    /// Parse the whole description. Returns `true` if no error was reported.
    pub fn parse_network(&mut self) -> bool {
        loop {
            match self.current.kind {
                SymbolKind::Heading(heading) => {
                    if self.parse_section(heading).is_err() {
                        break;
                    }
                }
                SymbolKind::Eof => {
                    self.check_required_sections();
                    break;
                }
                _ => {
                    self.unexpected("a section heading");
                    self.recover_to(&[Anchor::Heading, Anchor::Eof]);
                }
            }
        }
        debug!("parse finished with {} error(s)", self.error_count());
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Skip symbols until one matches an anchor. End of input always stops.
    pub fn recover_to(&mut self, anchors: &[Anchor]) {
        while self.current.kind != SymbolKind::Eof
            && !anchors.iter().any(|anchor| anchor.matches(self.current.kind))
        {
            self.advance();
        }
    }

    // ============ Sections ============

    /// An `Err` means parsing cannot continue at all.
    fn parse_section(&mut self, heading: Heading) -> Step<()> {
        let at = self.current.clone();
        debug!("parsing '{}' section", heading);

        if heading != Heading::Devices && !self.seen.contains(&Heading::Devices) {
            return Err(self.report(
                &at,
                DiagnosticKind::Syntax,
                format!("'{}' section found before the 'devices' section", heading),
            ));
        }
        if self.seen.contains(&heading) {
            self.report(&at, DiagnosticKind::Syntax, format!("duplicate '{}' section", heading));
        } else {
            self.seen.push(heading);
        }

        self.advance();
        if self.current.kind != SymbolKind::OpenBrace {
            self.unexpected("'{'");
            self.recover_to(&[Anchor::Heading, Anchor::Eof]);
            return Ok(());
        }
        self.mode = match heading {
            Heading::Devices => NameMode::Declare,
            _ => NameMode::Query,
        };
        self.advance();

        while !self.at_section_end() {
            let step = match heading {
                Heading::Devices => self.parse_device_statement(false),
                Heading::Init => self.parse_device_statement(true),
                Heading::Connections => self.parse_connection_block(),
                Heading::Monitor => self.parse_monitor_statement(),
            };
            if step.is_err() {
                self.recover_statement();
            }
        }

        self.mode = NameMode::Declare;
        let close = self.current.clone();
        if close.kind == SymbolKind::CloseBrace {
            self.advance();
        } else {
            self.unexpected("'}' to close the section");
        }

        match heading {
            Heading::Devices => self.check_devices(&close),
            Heading::Connections => self.check_connections(&close),
            Heading::Monitor | Heading::Init => {}
        }
        Ok(())
    }

    fn check_required_sections(&mut self) {
        let eof = self.current.clone();
        for heading in [Heading::Devices, Heading::Connections] {
            if !self.seen.contains(&heading) {
                self.report(&eof, DiagnosticKind::Syntax, format!("missing '{}' section", heading));
            }
        }
    }

    fn check_devices(&mut self, at: &Symbol) {
        for id in devices_without_inputs(self.network.devices()) {
            let message = format!("device '{}' has no inputs", self.name_of(id));
            self.report(at, DiagnosticKind::Semantic, message);
        }
    }

    fn check_connections(&mut self, at: &Symbol) {
        for (device, port) in self.network.unconnected_inputs() {
            let message = format!(
                "all inputs must be connected: '{}' is not connected",
                self.signal_label(device, Some(port))
            );
            self.report(at, DiagnosticKind::Semantic, message);
        }
    }

    // ============ Devices and init ============

    fn parse_device_statement(&mut self, in_init: bool) -> Step<()> {
        let targets = self.parse_name_list()?;
        let verb = self.current.clone();

        match verb.kind {
            SymbolKind::Keyword(Keyword::Is | Keyword::Are) if !in_init => {
                self.advance();
                let kind = self.parse_device_type()?;
                self.expect_semicolon()?;
                for (id, at) in &targets {
                    self.define_device(*id, kind, at);
                }
            }
            SymbolKind::Keyword(Keyword::Has | Keyword::Have) => {
                self.advance();
                if self.current.kind == SymbolKind::Keyword(Keyword::Cycle) {
                    self.advance();
                    let (half_period, at_value) = self.expect_number()?;
                    if half_period == 0 {
                        return Err(self.report(
                            &at_value,
                            DiagnosticKind::Semantic,
                            "clock cycle must be at least 1",
                        ));
                    }
                    self.expect_semicolon()?;
                    for (id, at) in &targets {
                        self.configure_clock(*id, half_period, at);
                    }
                } else if in_init {
                    return Err(self.report(&verb, DiagnosticKind::Syntax, INIT_ONLY));
                } else {
                    let (count, _) = self.expect_number()?;
                    self.expect_semicolon()?;
                    for (id, at) in &targets {
                        self.configure_inputs(*id, count, at);
                    }
                }
            }
            SymbolKind::Keyword(Keyword::Set) => {
                self.advance();
                if self.current.kind == SymbolKind::Keyword(Keyword::To) {
                    self.advance();
                }
                let (value, at_value) = self.expect_number()?;
                let level = match value {
                    0 => Signal::Low,
                    1 => Signal::High,
                    _ => {
                        return Err(self.report(
                            &at_value,
                            DiagnosticKind::Semantic,
                            format!("switch level must be 0 or 1, not {}", value),
                        ));
                    }
                };
                self.expect_semicolon()?;
                for (id, at) in &targets {
                    self.configure_switch(*id, level, at);
                }
            }
            _ if in_init => return Err(self.report(&verb, DiagnosticKind::Syntax, INIT_ONLY)),
            _ => return Err(self.unexpected("'is', 'are', 'has', 'have' or 'set'")),
        }
        Ok(())
    }

    /// `A, B, C` or `A1 => A4`.
    fn parse_name_list(&mut self) -> Step<Vec<(NameId, Symbol)>> {
        let first = self.expect_name()?;
        if self.current.kind == SymbolKind::Arrow {
            self.advance();
            let (_, last) = self.expect_name()?;
            return self.expand_names(&first.1, &last);
        }
        let mut list = vec![first];
        while self.current.kind == SymbolKind::Comma {
            self.advance();
            list.push(self.expect_name()?);
        }
        Ok(list)
    }

    fn expand_names(&mut self, first: &Symbol, last: &Symbol) -> Step<Vec<(NameId, Symbol)>> {
        let expanded = match expand_range(&first.text, &last.text) {
            Ok(expanded) => expanded,
            Err(e) => return Err(self.report(first, e.kind(), e.to_string())),
        };
        let mut list = Vec::with_capacity(expanded.len());
        for name in expanded {
            let id = match self.mode {
                NameMode::Declare => self.names.lookup(&name).ok(),
                NameMode::Query => self.names.query(&name),
            };
            match id {
                Some(id) => list.push((id, first.clone())),
                None => {
                    return Err(self.report(
                        first,
                        DiagnosticKind::Semantic,
                        format!("device '{}' does not exist", name),
                    ));
                }
            }
        }
        Ok(list)
    }

    fn parse_device_type(&mut self) -> Step<DeviceKind> {
        let symbol = self.current.clone();
        if !matches!(symbol.kind, SymbolKind::Name(_) | SymbolKind::UnknownName) {
            return Err(self.unexpected("a device type"));
        }
        self.advance();

        // D-TYPE arrives as `D`, `-`, `TYPE`.
        if symbol.text.eq_ignore_ascii_case("D") && self.current.kind == SymbolKind::Minus {
            self.advance();
            let is_type = matches!(self.current.kind, SymbolKind::Name(_) | SymbolKind::UnknownName)
                && self.current.text.eq_ignore_ascii_case("TYPE");
            if !is_type {
                return Err(self.unexpected("'TYPE' after 'D-'"));
            }
            self.advance();
            return Ok(DeviceKind::DType);
        }

        match DeviceKind::from_keyword(&symbol.text) {
            Some(kind) => Ok(kind),
            None if symbol.text.eq_ignore_ascii_case("RC") => Err(self.report(
                &symbol,
                DiagnosticKind::Semantic,
                "device type 'RC' is reserved and not supported",
            )),
            None => Err(self.report(
                &symbol,
                DiagnosticKind::Syntax,
                format!("unknown device type '{}'", symbol.text),
            )),
        }
    }

    fn define_device(&mut self, id: DeviceId, kind: DeviceKind, at: &Symbol) {
        if !self.network.devices_mut().make_device(id, kind) {
            let message = format!("device '{}' is already defined", self.name_of(id));
            self.report(at, DiagnosticKind::Semantic, message);
        }
    }

    fn configure_inputs(&mut self, id: DeviceId, count: u32, at: &Symbol) {
        let name = self.name_of(id);
        let (kind, has_inputs) = match self.network.devices().get(id) {
            Some(device) => (device.kind, !device.inputs.is_empty()),
            None => {
                self.report(at, DiagnosticKind::Semantic, format!("device '{}' does not exist", name));
                return;
            }
        };
        let count = count as usize;

        let problem = match kind {
            DeviceKind::Not | DeviceKind::Xor => kind
                .fixed_input_count()
                .filter(|&fixed| fixed != count)
                .map(|fixed| {
                    let plural = if fixed == 1 { "" } else { "s" };
                    format!("{} gate '{}' must have exactly {} input{}", kind, name, fixed, plural)
                }),
            DeviceKind::DType => Some(format!("inputs of DTYPE device '{}' are fixed", name)),
            DeviceKind::Switch | DeviceKind::Clock => {
                Some(format!("{} device '{}' takes no inputs", kind, name))
            }
            _ if !kind.has_variable_inputs() => None,
            _ if count == 0 => Some(format!("gate '{}' needs at least 1 input", name)),
            _ if count > MAX_INPUTS => Some(format!("max inputs allowed is {}", MAX_INPUTS)),
            _ if has_inputs => Some(format!("inputs of '{}' are already given", name)),
            _ => None,
        };

        match problem {
            Some(message) => {
                self.report(at, DiagnosticKind::Semantic, message);
            }
            None if kind.has_variable_inputs() => {
                self.network.devices_mut().add_inputs(id, count);
            }
            None => {}
        }
    }

    fn configure_clock(&mut self, id: DeviceId, half_period: u32, at: &Symbol) {
        let name = self.name_of(id);
        let message = match self.network.devices().get(id) {
            None => format!("device '{}' does not exist", name),
            Some(device) if device.kind != DeviceKind::Clock => format!("device '{}' is not a CLOCK", name),
            Some(_) => {
                self.network.devices_mut().set_clock_half_period(id, half_period);
                return;
            }
        };
        self.report(at, DiagnosticKind::Semantic, message);
    }

    fn configure_switch(&mut self, id: DeviceId, level: Signal, at: &Symbol) {
        let name = self.name_of(id);
        let message = match self.network.devices().get(id) {
            None => format!("device '{}' does not exist", name),
            Some(device) if device.kind != DeviceKind::Switch => format!("device '{}' is not a SWITCH", name),
            Some(_) => {
                self.network.devices_mut().set_switch(id, level);
                return;
            }
        };
        self.report(at, DiagnosticKind::Semantic, message);
    }

    // ============ Connections ============

    fn parse_connection_block(&mut self) -> Step<()> {
        self.expect_keyword(Keyword::Device)?;
        let header = self.current.clone();
        let block = match header.kind {
            SymbolKind::Name(id) if self.network.devices().contains(id) => id,
            SymbolKind::Name(_) | SymbolKind::UnknownName => {
                self.report(
                    &header,
                    DiagnosticKind::Semantic,
                    format!("device '{}' does not exist", header.text),
                );
                self.skip_block();
                return Ok(());
            }
            _ => return Err(self.unexpected("a device name")),
        };
        self.advance();
        self.expect(SymbolKind::OpenBrace, "'{'")?;

        while !self.at_section_end() {
            if self.parse_connection(block, &header).is_err() {
                self.recover_statement();
            }
        }
        self.expect(SymbolKind::CloseBrace, "'}' to close the device block")
    }

    /// Skip a block whose header could not be used, header name included.
    fn skip_block(&mut self) {
        self.advance();
        if self.current.kind == SymbolKind::OpenBrace {
            self.advance();
            self.recover_to(&[Anchor::CloseBrace, Anchor::Heading, Anchor::Eof]);
            if self.current.kind == SymbolKind::CloseBrace {
                self.advance();
            }
        }
    }

    fn parse_connection(&mut self, block: DeviceId, header: &Symbol) -> Step<()> {
        let (source, source_at) = self.parse_output_ref()?;
        self.expect_keyword(Keyword::To)?;
        let (target, target_at) = self.expect_name()?;
        if target != block {
            return Err(self.report(
                &target_at,
                DiagnosticKind::Syntax,
                format!(
                    "connection to '{}' inside the block for device '{}'",
                    target_at.text, header.text
                ),
            ));
        }
        self.expect(SymbolKind::Dot, "'.' and an input name")?;
        let (input, _) = self.expect_port()?;
        self.expect_semicolon()?;

        if let Err(e) = self.network.make_connection(source, target, input) {
            let message = self.connection_message(e, source, target, input);
            self.report(&source_at, DiagnosticKind::Semantic, message);
        }
        Ok(())
    }

    fn connection_message(
        &self,
        error: ConnectionError,
        source: PortRef,
        device: DeviceId,
        input: NameId,
    ) -> String {
        let source_name = self.signal_label(source.device, source.port);
        let input_name = self.signal_label(device, Some(input));
        let input_exists = self
            .network
            .devices()
            .get(device)
            .is_some_and(|d| d.has_input(input));
        match error {
            ConnectionError::DeviceAbsent => {
                format!("device '{}' does not exist", self.name_of(source.device))
            }
            ConnectionError::PortAbsent if !input_exists => format!("'{}' is not an input", input_name),
            ConnectionError::PortAbsent => format!("'{}' is not an output", source_name),
            ConnectionError::InputConnected => format!("input '{}' is already connected", input_name),
            ConnectionError::InputToInput => {
                format!("'{}' is an input and cannot drive '{}'", source_name, input_name)
            }
        }
    }

    /// `A` or `A.Q`.
    fn parse_output_ref(&mut self) -> Step<(PortRef, Symbol)> {
        let (device, at) = self.expect_name()?;
        if self.current.kind != SymbolKind::Dot {
            return Ok((PortRef::new(device, None), at));
        }
        self.advance();
        let (port, _) = self.expect_port()?;
        Ok((PortRef::new(device, Some(port)), at))
    }

    // ============ Monitors ============

    fn parse_monitor_statement(&mut self) -> Step<()> {
        if self.current.kind == SymbolKind::Keyword(Keyword::Trace) {
            self.advance();
        }
        let mut outputs = vec![self.parse_output_ref()?];
        while self.current.kind == SymbolKind::Comma {
            self.advance();
            outputs.push(self.parse_output_ref()?);
        }
        self.expect_semicolon()?;

        for (output, at) in outputs {
            let Err(e) = self.monitors.make_monitor(self.network, output.device, output.port) else {
                continue;
            };
            let label = self.signal_label(output.device, output.port);
            let message = match e {
                MonitorError::DeviceAbsent => format!("device '{}' does not exist", self.name_of(output.device)),
                MonitorError::NotOutput => format!("'{}' is not an output", label),
                MonitorError::MonitorPresent => format!("already monitoring '{}'", label),
            };
            self.report(&at, DiagnosticKind::Semantic, message);
        }
        Ok(())
    }

    // ============ Symbol handling ============

    fn advance(&mut self) {
        loop {
            match self.scanner.get_symbol(self.names, self.mode) {
                Ok(symbol) => {
                    self.current = symbol;
                    return;
                }
                Err(diagnostic) => self.diagnostics.push(diagnostic),
            }
        }
    }

    fn at_section_end(&self) -> bool {
        matches!(
            self.current.kind,
            SymbolKind::CloseBrace | SymbolKind::Heading(_) | SymbolKind::Eof
        )
    }

    fn recover_statement(&mut self) {
        self.recover_to(STATEMENT_END);
        if self.current.kind == SymbolKind::Semicolon {
            self.advance();
        }
    }

    fn expect(&mut self, kind: SymbolKind, expected: &str) -> Step<()> {
        if self.current.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Step<()> {
        self.expect(SymbolKind::Keyword(keyword), &format!("'{}'", keyword))
    }

    fn expect_semicolon(&mut self) -> Step<()> {
        self.expect(SymbolKind::Semicolon, "';'")
    }

    fn expect_number(&mut self) -> Step<(u32, Symbol)> {
        let symbol = self.current.clone();
        match symbol.kind {
            SymbolKind::Number(value) => {
                self.advance();
                Ok((value, symbol))
            }
            _ => Err(self.unexpected("a number")),
        }
    }

    fn expect_name(&mut self) -> Step<(NameId, Symbol)> {
        let symbol = self.current.clone();
        match symbol.kind {
            SymbolKind::Name(id) => {
                self.advance();
                Ok((id, symbol))
            }
            SymbolKind::UnknownName => Err(self.report(
                &symbol,
                DiagnosticKind::Semantic,
                format!("device '{}' does not exist", symbol.text),
            )),
            _ => Err(self.unexpected("a device name")),
        }
    }

    fn expect_port(&mut self) -> Step<(NameId, Symbol)> {
        let symbol = self.current.clone();
        match symbol.kind {
            SymbolKind::Name(id) => {
                self.advance();
                Ok((id, symbol))
            }
            SymbolKind::UnknownName => Err(self.report(
                &symbol,
                DiagnosticKind::Semantic,
                format!("port '{}' does not exist", symbol.text),
            )),
            _ => Err(self.unexpected("a port name")),
        }
    }

    // ============ Reporting ============

    fn report(&mut self, at: &Symbol, kind: DiagnosticKind, message: impl Into<String>) -> Reported {
        let diagnostic = self.scanner.diagnostic(kind, message, at.line, at.column);
        self.diagnostics.push(diagnostic);
        Reported
    }

    fn unexpected(&mut self, expected: &str) -> Reported {
        let at = self.current.clone();
        let found = match at.kind {
            SymbolKind::Eof => "end of file".to_string(),
            _ => format!("'{}'", at.text),
        };
        self.report(&at, DiagnosticKind::Syntax, format!("expected {}, found {}", expected, found))
    }

    fn name_of(&self, id: NameId) -> String {
        self.names.get_string(id).unwrap_or("?").to_string()
    }

    fn signal_label(&self, device: DeviceId, port: Option<NameId>) -> String {
        match port {
            None => self.name_of(device),
            Some(port) => format!("{}.{}", self.name_of(device), self.name_of(port)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Devices;

    struct Parsed {
        names: Names,
        network: Network,
        monitors: Monitors,
        ok: bool,
        diagnostics: Diagnostics,
    }

    impl Parsed {
        fn kinds(&self) -> Vec<DiagnosticKind> {
            self.diagnostics.iter().map(|d| d.kind).collect()
        }

        fn messages(&self) -> Vec<String> {
            self.diagnostics.iter().map(|d| d.message.clone()).collect()
        }

        fn id(&self, name: &str) -> DeviceId {
            self.names.query(name).unwrap()
        }
    }

    fn parse(text: &str) -> Parsed {
        let mut names = Names::new();
        let devices = Devices::new(&mut names);
        let mut network = Network::new(devices);
        let mut monitors = Monitors::new();
        let mut parser = Parser::new(&mut names, &mut network, &mut monitors, Scanner::new(text));
        let ok = parser.parse_network();
        let diagnostics = parser.into_diagnostics();
        Parsed {
            names,
            network,
            monitors,
            ok,
            diagnostics,
        }
    }

    const VALID: &str = "
        devices {
          A is a NAND gate;
          B is a DTYPE;
          A has 2 inputs;
          S1, S2 are SWITCH;
          S1 set 1;
          CLK1 is CLOCK;
          CLK1 has cycle 5;
        }
        connections {
          device A {
            S1 to A.I1;
            S2 to A.I2;
          }
          device B {
            CLK1 to B.CLK;
            A to B.DATA;
            S2 to B.SET;
            S2 to B.CLEAR;
          }
        }
        monitor {
          A, B.Q, B.QBAR;
        }
    ";

    #[test]
    fn test_parse_valid_circuit() {
        let parsed = parse(VALID);
        assert!(parsed.ok, "{}", parsed.diagnostics);
        assert!(parsed.diagnostics.is_empty());

        let devices = parsed.network.devices();
        assert_eq!(devices.len(), 5);
        assert_eq!(devices.get(parsed.id("B")).unwrap().kind, DeviceKind::DType);
        assert_eq!(devices.output_signal(parsed.id("S1"), None), Some(Signal::High));
        assert_eq!(devices.get(parsed.id("CLK1")).unwrap().clock_half_period, 5);
        assert!(parsed.network.check_network());
        assert_eq!(
            parsed.monitors.get_signal_names(&parsed.names, &parsed.network),
            vec!["A", "B.Q", "B.QBAR"]
        );
    }

    #[test]
    fn test_section_before_devices_stops_parse() {
        let parsed = parse("connections{} devices{ S is SWITCH; }");
        assert!(!parsed.ok);
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Syntax]);
        assert!(parsed.network.devices().is_empty());
    }

    #[test]
    fn test_missing_sections() {
        let parsed = parse("devices { S is SWITCH; }");
        assert_eq!(parsed.messages(), vec!["missing 'connections' section"]);

        let parsed = parse("");
        assert_eq!(parsed.diagnostics.len(), 2);
    }

    #[test]
    fn test_duplicate_section_still_parsed() {
        let parsed = parse("devices { S is SWITCH; } DEVICES { T is SWITCH; } connections { }");
        assert_eq!(parsed.messages(), vec!["duplicate 'devices' section"]);
        assert_eq!(parsed.network.devices().len(), 2);
    }

    #[test]
    fn test_range_notation() {
        let parsed = parse("devices { SW1 => SW4 are SWITCH; SW2 => SW3 set 1; } connections { }");
        assert!(parsed.ok, "{}", parsed.diagnostics);
        assert_eq!(parsed.network.devices().len(), 4);
        let devices = parsed.network.devices();
        assert_eq!(devices.output_signal(parsed.id("SW1"), None), Some(Signal::Low));
        assert_eq!(devices.output_signal(parsed.id("SW3"), None), Some(Signal::High));

        let parsed = parse("devices { A4 => A1 are SWITCH; } connections { }");
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Value]);
        let parsed = parse("devices { A1 => B4 are SWITCH; } connections { }");
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Syntax]);
    }

    #[test]
    fn test_expand_range() {
        assert_eq!(expand_range("A1", "A4").unwrap(), vec!["A1", "A2", "A3", "A4"]);
        assert_eq!(expand_range("A4", "A1"), Err(RangeError::Descending(4, 1)));
        assert_eq!(expand_range("A4", "A1").unwrap_err().kind(), DiagnosticKind::Value);
        assert_eq!(
            expand_range("A1", "B4").unwrap_err().kind(),
            DiagnosticKind::Syntax
        );
        assert_eq!(expand_range("A", "A4"), Err(RangeError::MissingSuffix("A".to_string())));
    }

    #[test]
    fn test_expand_range_limit() {
        assert_eq!(expand_range("A1", "A1024").unwrap().len(), MAX_RANGE_LEN);
        let err = expand_range("A0", "A1024").unwrap_err();
        assert_eq!(
            err,
            RangeError::TooLong {
                len: 1025,
                limit: MAX_RANGE_LEN
            }
        );
        assert_eq!(err.kind(), DiagnosticKind::Semantic);
        assert!(expand_range("A0", "A4294967295").is_err());

        let parsed = parse("devices { A1 => A2000000 are SWITCH; } connections { }");
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Semantic]);
        assert!(parsed.network.devices().is_empty());
    }

    #[test]
    fn test_input_count_rules() {
        let parsed = parse(
            "devices {
               N is NOT; X is XOR; G is AND;
               N has 3 inputs;
               X has 3 inputs;
               G has 17 inputs;
               G has 2 inputs;
             }
             connections { }",
        );
        let kinds = parsed.kinds();
        assert_eq!(&kinds[..3], &[DiagnosticKind::Semantic; 3]);
        assert_eq!(parsed.messages()[0], "NOT gate 'N' must have exactly 1 input");
        assert_eq!(parsed.messages()[1], "XOR gate 'X' must have exactly 2 inputs");
        assert_eq!(parsed.messages()[2], "max inputs allowed is 16");
        // N.I1, X.I1, X.I2, G.I1, G.I2 left unconnected.
        assert_eq!(parsed.diagnostics.len(), 8);
    }

    #[test]
    fn test_gate_without_inputs_reported() {
        let parsed = parse("devices { G is OR; } connections { }");
        assert_eq!(parsed.messages(), vec!["device 'G' has no inputs"]);
    }

    #[test]
    fn test_device_types() {
        let parsed = parse("devices { A is a D-TYPE; B is dtype; } connections { }");
        assert_eq!(parsed.network.devices().get(parsed.id("A")).unwrap().kind, DeviceKind::DType);
        assert_eq!(parsed.network.devices().get(parsed.id("B")).unwrap().kind, DeviceKind::DType);

        let parsed = parse("devices { A is RC; B is WIRE; C is SWITCH; C is SWITCH; } connections { }");
        assert_eq!(
            parsed.kinds(),
            vec![DiagnosticKind::Semantic, DiagnosticKind::Syntax, DiagnosticKind::Semantic]
        );
        assert_eq!(parsed.messages()[2], "device 'C' is already defined");
    }

    #[test]
    fn test_attribute_statements() {
        let parsed = parse(
            "devices {
               S is SWITCH; C is CLOCK;
               S set to 2;
               C has cycle 0;
               C set 1;
               S has cycle 4;
               Q has 2 inputs;
             }
             connections { }",
        );
        assert_eq!(
            parsed.messages(),
            vec![
                "switch level must be 0 or 1, not 2",
                "clock cycle must be at least 1",
                "device 'C' is not a SWITCH",
                "device 'S' is not a CLOCK",
                "device 'Q' does not exist",
            ]
        );
    }

    #[test]
    fn test_init_section() {
        let parsed = parse(
            "devices { S is SWITCH; C is CLOCK; }
             connections { }
             init { S set 1; C has cycle 3; S is SWITCH; }",
        );
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Syntax]);
        let devices = parsed.network.devices();
        assert_eq!(devices.output_signal(parsed.id("S"), None), Some(Signal::High));
        assert_eq!(devices.get(parsed.id("C")).unwrap().clock_half_period, 3);
    }

    #[test]
    fn test_missing_semicolon_recovers() {
        let parsed = parse("devices { S1 is SWITCH S2 is SWITCH; S3 is SWITCH; } connections { }");
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Syntax]);
        assert_eq!(parsed.network.devices().len(), 1);
        assert!(parsed.names.query("S3").is_some());
    }

    #[test]
    fn test_scanner_error_does_not_stop_parse() {
        let parsed = parse("devices { S1 is SWITCH; @ S2 is SWITCH; } connections { }");
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Syntax]);
        assert_eq!(parsed.network.devices().len(), 2);
    }

    #[test]
    fn test_connection_errors() {
        let parsed = parse(
            "devices { S1, S2 are SWITCH; A is AND; A has 2 inputs; }
             connections {
               device A {
                 S1 to A.I1;
                 S2 to A.I1;
                 A.I1 to A.I2;
                 S2 to A.I3;
                 S2 to B.I2;
                 S2 to A.I2;
               }
             }",
        );
        assert_eq!(
            parsed.messages(),
            vec![
                "input 'A.I1' is already connected",
                "'A.I1' is an input and cannot drive 'A.I2'",
                "'A.I3' is not an input",
                "device 'B' does not exist",
            ]
        );
        assert!(parsed.network.check_network());
    }

    #[test]
    fn test_block_target_mismatch() {
        let parsed = parse(
            "devices { S is SWITCH; A, B are NOT; }
             connections {
               device A { S to A.I1; S to B.I1; }
               device B { S to B.I1; }
             }",
        );
        assert_eq!(parsed.kinds(), vec![DiagnosticKind::Syntax]);
        assert!(parsed.network.check_network());
    }

    #[test]
    fn test_unknown_block_device_skipped() {
        let parsed = parse(
            "devices { S is SWITCH; N is NOT; }
             connections {
               device Z { S to Z.I1; S to Z.I2; }
               device N { S to N.I1; }
             }",
        );
        assert_eq!(parsed.messages(), vec!["device 'Z' does not exist"]);
    }

    #[test]
    fn test_unconnected_inputs_reported_each() {
        let parsed = parse("devices { S is SWITCH; A is XOR; } connections { device A { S to A.I1; } }");
        assert_eq!(
            parsed.messages(),
            vec!["all inputs must be connected: 'A.I2' is not connected"]
        );
    }

    #[test]
    fn test_monitor_errors() {
        let parsed = parse(
            "devices { S is SWITCH; D is DTYPE; }
             connections {
               device D { S to D.CLK; S to D.DATA; S to D.SET; S to D.CLEAR; }
             }
             monitor { S; trace S, D; D.DATA; D.Q; GHOST; }",
        );
        assert_eq!(
            parsed.messages(),
            vec![
                "already monitoring 'S'",
                "'D' is not an output",
                "'D.DATA' is not an output",
                "device 'GHOST' does not exist",
            ]
        );
        assert_eq!(parsed.monitors.len(), 2);
    }

    #[test]
    fn test_recover_to_anchor() {
        let mut names = Names::new();
        let devices = Devices::new(&mut names);
        let mut network = Network::new(devices);
        let mut monitors = Monitors::new();
        let scanner = Scanner::new("A B C ; D } devices");
        let mut parser = Parser::new(&mut names, &mut network, &mut monitors, scanner);

        parser.recover_to(&[Anchor::Semicolon]);
        assert_eq!(parser.current.kind, SymbolKind::Semicolon);
        parser.recover_to(&[Anchor::Semicolon]);
        assert_eq!(parser.current.kind, SymbolKind::Semicolon, "already on an anchor");
        parser.advance();
        parser.recover_to(&[Anchor::Heading]);
        assert_eq!(parser.current.kind, SymbolKind::Heading(Heading::Devices));
        parser.advance();
        parser.recover_to(&[Anchor::Semicolon]);
        assert_eq!(parser.current.kind, SymbolKind::Eof);
        assert_eq!(parser.error_count(), 0);
    }
}
