//! Prometheus text exposition format (version 0.0.4).
//!
//! Rendering is an explicit two-level walk: schema entries outside,
//! that metric's observations inside. Every schema entry therefore gets
//! its header lines and its terminating blank line, even in a scrape
//! where it has no samples.

use super::observation::{CollectionResult, LabelSet, Observation};
use super::schema::{MetricSchema, MetricSchemaEntry};
use std::fmt::{self, Write};

/// Content type of a rendered body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// A schema and one run's result, rendered through [`fmt::Display`].
#[derive(Debug, Clone, Copy)]
pub struct Exposition<'a> {
    schema: &'a MetricSchema,
    result: &'a CollectionResult,
}

impl<'a> Exposition<'a> {
    pub fn new(schema: &'a MetricSchema, result: &'a CollectionResult) -> Self {
        Self { schema, result }
    }
}

impl fmt::Display for Exposition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.schema.entries() {
            write_header(f, entry)?;
            for observation in self.result.observations_for(entry.name) {
                write_sample(f, observation, self.result.timestamp_ms)?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}

/// Renders a full exposition body.
pub fn render(schema: &MetricSchema, result: &CollectionResult) -> String {
    Exposition::new(schema, result).to_string()
}

fn write_header(w: &mut impl Write, entry: &MetricSchemaEntry) -> fmt::Result {
    if let Some(help) = entry.help {
        write!(w, "# HELP {} ", entry.name)?;
        write_escaped(w, help, false)?;
        w.write_char('\n')?;
    }
    writeln!(w, "# TYPE {} {}", entry.name, entry.metric_type)
}

fn write_sample(w: &mut impl Write, observation: &Observation, timestamp_ms: i64) -> fmt::Result {
    w.write_str(observation.metric)?;
    write_labels(w, &observation.labels)?;
    writeln!(w, " {} {}", observation.value, timestamp_ms)
}

fn write_labels(w: &mut impl Write, labels: &LabelSet) -> fmt::Result {
    if labels.is_empty() {
        return Ok(());
    }
    w.write_char('{')?;
    for (i, (name, value)) in labels.iter().enumerate() {
        if i > 0 {
            w.write_char(',')?;
        }
        write!(w, "{}=\"", name)?;
        write_escaped(w, value, true)?;
        w.write_char('"')?;
    }
    w.write_char('}')
}

/// Escapes `\` and newline, plus `"` inside label values.
fn write_escaped(w: &mut impl Write, s: &str, quote: bool) -> fmt::Result {
    for c in s.chars() {
        match c {
            '\\' => w.write_str("\\\\")?,
            '\n' => w.write_str("\\n")?,
            '"' if quote => w.write_str("\\\"")?,
            c => w.write_char(c)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::observation::MOUNTPOINT_LABEL;
    use crate::metrics::schema::{SOURCE_LISTENERS, SOURCE_TOTAL_BYTES_SENT};
    use proptest::prelude::*;

    const TS: i64 = 1_700_000_000_123;

    fn two_metric_schema() -> MetricSchema {
        MetricSchema::new([
            MetricSchemaEntry::gauge(SOURCE_LISTENERS),
            MetricSchemaEntry::counter(SOURCE_TOTAL_BYTES_SENT),
        ])
    }

    fn at(mount: &str, metric: &'static str, value: u64) -> Observation {
        Observation::new(metric, value).with_label(MOUNTPOINT_LABEL, mount)
    }

    #[test]
    fn test_renders_blocks_in_schema_order() {
        let result = CollectionResult::new(
            TS,
            vec![
                at("/a", SOURCE_TOTAL_BYTES_SENT, 1000),
                at("/a", SOURCE_LISTENERS, 5),
            ],
        );

        let expected = "\
# TYPE icecast_source_listeners gauge
icecast_source_listeners{mountpoint=\"/a\"} 5 1700000000123

# TYPE icecast_source_total_bytes_sent counter
icecast_source_total_bytes_sent{mountpoint=\"/a\"} 1000 1700000000123

";
        assert_eq!(render(&two_metric_schema(), &result), expected);
    }

    #[test]
    fn test_metric_without_observations_keeps_header_and_blank_line() {
        let result = CollectionResult::new(TS, vec![]);
        assert_eq!(
            render(&two_metric_schema(), &result),
            "# TYPE icecast_source_listeners gauge\n\n\
             # TYPE icecast_source_total_bytes_sent counter\n\n"
        );
    }

    #[test]
    fn test_help_line_precedes_type_line() {
        let schema = MetricSchema::new([
            MetricSchemaEntry::gauge("up").with_help("Whether the \\ upstream\nanswered")
        ]);
        let result = CollectionResult::new(TS, vec![Observation::new("up", 1)]);
        assert_eq!(
            render(&schema, &result),
            "# HELP up Whether the \\\\ upstream\\nanswered\n# TYPE up gauge\nup 1 1700000000123\n\n"
        );
    }

    #[test]
    fn test_unlabelled_sample_has_no_braces() {
        let schema = MetricSchema::new([MetricSchemaEntry::counter("scrapes")]);
        let result = CollectionResult::new(TS, vec![Observation::new("scrapes", 0)]);
        assert!(render(&schema, &result).contains("\nscrapes 0 1700000000123\n"));
    }

    #[test]
    fn test_multiple_labels_sorted_and_comma_separated() {
        let schema = MetricSchema::new([MetricSchemaEntry::gauge("m")]);
        let result = CollectionResult::new(
            TS,
            vec![Observation::new("m", 3)
                .with_label("zone", "eu")
                .with_label("mountpoint", "/a")],
        );
        assert!(render(&schema, &result)
            .contains("m{mountpoint=\"/a\",zone=\"eu\"} 3 1700000000123\n"));
    }

    #[test]
    fn test_label_values_escaped() {
        let schema = MetricSchema::new([MetricSchemaEntry::gauge("m")]);
        let result = CollectionResult::new(
            TS,
            vec![Observation::new("m", 1).with_label("mountpoint", "/a\"b\\c\nd")],
        );
        assert!(render(&schema, &result)
            .contains(r#"m{mountpoint="/a\"b\\c\nd"} 1 1700000000123"#));
    }

    #[test]
    fn test_observations_outside_schema_not_rendered() {
        let result = CollectionResult::new(
            TS,
            vec![Observation::new("not_in_schema", 1), at("/a", SOURCE_LISTENERS, 2)],
        );
        let body = render(&two_metric_schema(), &result);
        assert!(!body.contains("not_in_schema"));
        assert!(body.contains("icecast_source_listeners{mountpoint=\"/a\"} 2"));
    }

    #[test]
    fn test_large_values_rendered_exactly() {
        let result = CollectionResult::new(TS, vec![at("/a", SOURCE_TOTAL_BYTES_SENT, u64::MAX)]);
        assert!(render(&two_metric_schema(), &result)
            .contains("} 18446744073709551615 1700000000123\n"));
    }

    /// Undoes label value escaping.
    fn unescape(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some(other) => out.push(other),
                    None => {}
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    proptest! {
        #[test]
        fn prop_label_value_survives_escaping(value in "\\PC*|[\"\\\\\n/a-z]*") {
            let mut escaped = String::new();
            write_escaped(&mut escaped, &value, true).unwrap();

            prop_assert!(!escaped.contains('\n'));
            // Every quote in the escaped form is preceded by a backslash.
            let bytes = escaped.as_bytes();
            for (i, b) in bytes.iter().enumerate() {
                if *b == b'"' {
                    prop_assert!(i > 0 && bytes[i - 1] == b'\\');
                }
            }
            prop_assert_eq!(unescape(&escaped), value);
        }

        #[test]
        fn prop_one_line_per_observation_with_shared_timestamp(
            values in proptest::collection::vec(any::<u64>(), 0..8),
            ts in 0i64..i64::MAX,
        ) {
            let observations: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(i, v)| at(&format!("/m{}", i), SOURCE_LISTENERS, *v))
                .collect();
            let result = CollectionResult::new(ts, observations);
            let body = render(&two_metric_schema(), &result);

            let samples: Vec<&str> = body
                .lines()
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .collect();
            prop_assert_eq!(samples.len(), values.len());
            let suffix = format!(" {}", ts);
            for (line, v) in samples.iter().zip(&values) {
                prop_assert!(line.ends_with(&suffix));
                let expected_value = format!(" {} ", v);
                prop_assert!(line.contains(&expected_value));
            }
            prop_assert_eq!(body.matches("# TYPE ").count(), 2);
        }
    }
}
