use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::matcher::{self, MatchStats};
use crate::propagate::{self, PropagationStats};
use crate::{Corpus, RuleSet, TaggerError};

/// Receives every metric that ends up with at least one tag.
pub trait TagSink {
    /// Called once per tagged metric, in corpus order. Tags come in
    /// declaration order of their first appearance in the rules.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink cannot accept the record.
    fn emit(&mut self, path: &[u8], tags: &[&str]) -> io::Result<()>;
}

impl TagSink for Vec<(Vec<u8>, Vec<String>)> {
    fn emit(&mut self, path: &[u8], tags: &[&str]) -> io::Result<()> {
        self.push((
            path.to_vec(),
            tags.iter().map(|&t| t.to_owned()).collect(),
        ));
        Ok(())
    }
}

/// Writes one `path<TAB>tag,tag,...` line per tagged metric.
///
/// Paths that are not valid UTF-8 are rendered lossily.
#[derive(Debug)]
pub struct WriterSink<W> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TagSink for WriterSink<W> {
    fn emit(&mut self, path: &[u8], tags: &[&str]) -> io::Result<()> {
        writeln!(
            self.out,
            "{}\t{}",
            String::from_utf8_lossy(path),
            tags.join(",")
        )
    }
}

/// Counts and stage timings of one batch run.
#[derive(Debug, Clone)]
#[must_use]
pub struct RunReport {
    metrics: usize,
    tagged: usize,
    matches: MatchStats,
    propagation: PropagationStats,
    stages: Vec<(&'static str, Duration)>,
}

impl RunReport {
    /// Number of metrics in the corpus.
    #[must_use]
    pub fn metrics(&self) -> usize {
        self.metrics
    }

    /// Number of metrics emitted with a non-empty tag set.
    #[must_use]
    pub fn tagged(&self) -> usize {
        self.tagged
    }

    #[must_use]
    pub fn matches(&self) -> MatchStats {
        self.matches
    }

    #[must_use]
    pub fn propagation(&self) -> PropagationStats {
        self.propagation
    }

    /// Wall-clock duration of each stage, in execution order.
    #[must_use]
    pub fn stages(&self) -> &[(&'static str, Duration)] {
        &self.stages
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} metrics, {} tagged ({} indexed + {} scanned matches)",
            self.metrics, self.tagged, self.matches.indexed, self.matches.scanned,
        )?;
        for (stage, elapsed) in &self.stages {
            write!(f, "\n  {stage}: {elapsed:?}")?;
        }
        Ok(())
    }
}

/// Decode `buf`, match `ruleset` against it, propagate tags through the
/// hierarchy and emit every tagged metric to `sink`.
///
/// Decoding happens before anything else: a malformed buffer fails the run
/// without a single record reaching the sink.
///
/// # Errors
///
/// Returns [`TaggerError::Decode`] for a malformed buffer and
/// [`TaggerError::Io`] if the sink fails.
pub fn tag_corpus(
    ruleset: &RuleSet,
    buf: &[u8],
    sink: &mut impl TagSink,
) -> Result<RunReport, TaggerError> {
    let mut stages = Vec::with_capacity(4);

    let start = Instant::now();
    let mut corpus = Corpus::decode(buf)?;
    stages.push(("decode", start.elapsed()));
    info!(metrics = corpus.len(), elapsed = ?start.elapsed(), "read and parse metrics");

    let start = Instant::now();
    let matches = matcher::run(ruleset, &mut corpus);
    stages.push(("match", start.elapsed()));

    let start = Instant::now();
    let propagation = propagate::propagate(&mut corpus);
    stages.push(("propagate", start.elapsed()));

    let start = Instant::now();
    let tagged = emit(ruleset, &corpus, sink)?;
    stages.push(("emit", start.elapsed()));
    debug!(tagged, elapsed = ?start.elapsed(), "emit tagged metrics");

    Ok(RunReport {
        metrics: corpus.len(),
        tagged,
        matches,
        propagation,
        stages,
    })
}

/// Emit every metric of `corpus` with a non-empty tag set, returning how many.
///
/// # Errors
///
/// Returns the first error reported by `sink`.
pub fn emit(ruleset: &RuleSet, corpus: &Corpus<'_>, sink: &mut impl TagSink) -> io::Result<usize> {
    let mut count = 0;
    let mut names = Vec::new();
    for metric in corpus.tagged() {
        names.clear();
        names.extend(ruleset.tag_names(metric.tags()));
        sink.emit(metric.path(), &names)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RuleSetBuilder, encode_paths};

    fn ruleset() -> RuleSet {
        RuleSetBuilder::new()
            .rule(|r| r.has_prefix("servers.").tag("category=servers"))
            .compile()
            .unwrap()
    }

    #[test]
    fn emits_only_tagged_metrics() {
        let buf = encode_paths(["servers.", "servers.web01.cpu.load", "other.metric"]);
        let mut sink: Vec<(Vec<u8>, Vec<String>)> = Vec::new();
        let report = tag_corpus(&ruleset(), &buf, &mut sink).unwrap();

        assert_eq!(report.metrics(), 3);
        assert_eq!(report.tagged(), 2);
        assert_eq!(
            sink,
            vec![
                (b"servers.".to_vec(), vec!["category=servers".to_owned()]),
                (
                    b"servers.web01.cpu.load".to_vec(),
                    vec!["category=servers".to_owned()]
                ),
            ]
        );
        let stages: Vec<&str> = report.stages().iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, ["decode", "match", "propagate", "emit"]);
    }

    #[test]
    fn malformed_buffer_emits_nothing() {
        let mut buf = encode_paths(["servers.a"]);
        buf.push(0x09);
        let mut sink: Vec<(Vec<u8>, Vec<String>)> = Vec::new();
        let err = tag_corpus(&ruleset(), &buf, &mut sink).unwrap_err();

        assert!(matches!(err, TaggerError::Decode(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn writer_sink_format() {
        let ruleset = RuleSetBuilder::new()
            .rule(|r| r.equal("a.b").tag("x").tag("y"))
            .compile()
            .unwrap();
        let buf = encode_paths(["a.b", "c"]);
        let mut sink = WriterSink::new(Vec::new());
        tag_corpus(&ruleset, &buf, &mut sink).unwrap();

        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "a.b\tx,y\n");
    }

    #[test]
    fn report_display() {
        let buf = encode_paths(["servers.a", "b"]);
        let mut sink: Vec<(Vec<u8>, Vec<String>)> = Vec::new();
        let report = tag_corpus(&ruleset(), &buf, &mut sink).unwrap();
        let text = report.to_string();
        assert!(text.starts_with("2 metrics, 1 tagged (1 indexed + 0 scanned matches)"));
        assert!(text.contains("propagate:"));
    }
}
