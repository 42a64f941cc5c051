use crate::domain::{
    ChannelKey, ChannelSeries, Dof, FrequencyAxis, NodeId, PsdError, PsdResult, PsdWarning,
    ResponseKind,
};
use crate::numerics::parse_solver_literal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const HEADER_MIN_TOKENS: usize = 5;
const DATA_ROW_MIN_TOKENS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub acceleration_headers: usize,
    pub displacement_headers: usize,
    pub malformed_headers: usize,
    pub accepted_rows: usize,
    pub skipped_rows: usize,
}

/// Everything recovered from one response file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponses {
    pub channels: BTreeMap<ChannelKey, ChannelSeries>,
    /// Nodes named by a well-formed header, including empty or unknown-DOF channels.
    pub nodes: BTreeSet<NodeId>,
    pub axis: FrequencyAxis,
    pub stats: ParseStats,
    pub warnings: Vec<PsdWarning>,
}

impl ParsedResponses {
    pub fn channel(&self, key: &ChannelKey) -> Option<&ChannelSeries> {
        self.channels.get(key)
    }

    /// Fails when the input produced no channels or no frequencies.
    pub fn ensure_populated(self, source_label: &str) -> PsdResult<Self> {
        if self.channels.is_empty() {
            return Err(PsdError::empty_input(format!(
                "no response channels recovered from '{source_label}'"
            )));
        }
        if self.axis.is_empty() {
            return Err(PsdError::empty_input(format!(
                "no frequency samples recovered from '{source_label}'"
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BlockState {
    Idle,
    InBlock(ChannelKey),
}

enum LineKind<'a> {
    Blank,
    Header(ResponseKind, Vec<&'a str>),
    OtherMarker,
    Data(Vec<&'a str>),
}

fn classify_line(line: &str) -> LineKind<'_> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return LineKind::Blank;
    };

    if let Some(kind) = ResponseKind::from_marker(first) {
        LineKind::Header(kind, tokens)
    } else if first.starts_with('$') {
        LineKind::OtherMarker
    } else {
        LineKind::Data(tokens)
    }
}

/// Block scanner state for a single parse. Build a fresh one per input.
#[derive(Debug)]
pub struct ParserContext {
    state: BlockState,
    channels: BTreeMap<ChannelKey, ChannelSeries>,
    nodes: BTreeSet<NodeId>,
    frequencies: Vec<f64>,
    stats: ParseStats,
    warnings: Vec<PsdWarning>,
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserContext {
    pub fn new() -> Self {
        Self {
            state: BlockState::Idle,
            channels: BTreeMap::new(),
            nodes: BTreeSet::new(),
            frequencies: Vec::new(),
            stats: ParseStats::default(),
            warnings: Vec::new(),
        }
    }

    /// `line_number` is 1-based and only used for diagnostics.
    pub fn feed_line(&mut self, line_number: usize, line: &str) {
        match classify_line(line) {
            LineKind::Blank | LineKind::OtherMarker => self.state = BlockState::Idle,
            LineKind::Header(kind, tokens) => self.open_block(line_number, line, kind, &tokens),
            LineKind::Data(tokens) => self.accept_row(line_number, &tokens),
        }
    }

    fn open_block(&mut self, line_number: usize, line: &str, kind: ResponseKind, tokens: &[&str]) {
        match kind {
            ResponseKind::Acceleration => self.stats.acceleration_headers += 1,
            ResponseKind::Displacement => self.stats.displacement_headers += 1,
        }

        let dof = if tokens.len() >= HEADER_MIN_TOKENS {
            tokens[3].parse::<i64>().ok().map(Dof::from_code)
        } else {
            None
        };
        let Some(dof) = dof else {
            self.stats.malformed_headers += 1;
            self.warnings.push(PsdWarning::MalformedHeader {
                line: line_number,
                text: line.trim().to_string(),
            });
            self.state = BlockState::Idle;
            return;
        };

        let node = NodeId::parse(tokens[2]);
        self.nodes.insert(node.clone());
        let key = ChannelKey::new(kind, node, dof);
        self.channels
            .entry(key.clone())
            .or_insert_with(|| ChannelSeries::new(key.clone()));
        self.state = BlockState::InBlock(key);
    }

    fn accept_row(&mut self, line_number: usize, tokens: &[&str]) {
        let BlockState::InBlock(key) = &self.state else {
            return;
        };
        if tokens.len() < DATA_ROW_MIN_TOKENS {
            return;
        }

        let parsed = parse_solver_literal(tokens[1])
            .and_then(|frequency| parse_solver_literal(tokens[2]).map(|value| (frequency, value)));
        match parsed {
            Ok((frequency, value)) => {
                if let Some(series) = self.channels.get_mut(key) {
                    series.push(frequency, value);
                    self.frequencies.push(frequency);
                    self.stats.accepted_rows += 1;
                }
            }
            Err(error) => {
                self.stats.skipped_rows += 1;
                debug!(line = line_number, channel = %key, "skipping data row: {error}");
            }
        }
    }

    pub fn finish(mut self) -> ParsedResponses {
        for series in self.channels.values().filter(|series| series.is_empty()) {
            self.warnings.push(PsdWarning::EmptyChannel {
                key: series.key().clone(),
            });
        }

        ParsedResponses {
            channels: self.channels,
            nodes: self.nodes,
            axis: FrequencyAxis::from_candidates(self.frequencies),
            stats: self.stats,
            warnings: self.warnings,
        }
    }
}

pub fn parse_response_blocks(source: &str) -> ParsedResponses {
    let mut context = ParserContext::new();
    for (index, line) in source.lines().enumerate() {
        context.feed_line(index + 1, line);
    }
    context.finish()
}
