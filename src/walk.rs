//! Depth-first traversal of an aggregation tree.
//!
//! ```text
//! PROJECT                      <- grouping node, column name
//!     "FC"                     <- partition, column value
//!         CAMPAIGN_ID
//!             "002"
//!                 REGISTRATIONS    <- terminal node
//!                     3
//!             "003"
//!                 REGISTRATIONS
//!                     1
//!
//! PROJECT  CAMPAIGN_ID  REGISTRATIONS
//! "FC"     "002"        3
//! "FC"     "003"        1
//! ```
//!
//! [`Walk`] keeps an explicit stack with one frame per open level and yields
//! one [`Record`] per pull.

use serde::Deserialize;
use serde_json::{map, Map, Value};
use std::iter::FusedIterator;
use std::slice;
use tracing::trace;

use crate::classify::{classify, Node};
use crate::Record;

/// Partition field carrying the group key.
pub const KEY: &str = "key";
/// Formatted key emitted next to `key` by date and numeric histograms.
pub const KEY_AS_STRING: &str = "key_as_string";

/// How grouping columns survive between sibling partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorScope {
    /// One accumulator for the whole walk. A column written under one branch
    /// stays visible to later siblings until something overwrites it.
    #[default]
    Shared,
    /// Every partition starts from the accumulator as it was when its
    /// grouping node was entered; that state is restored when the node is done.
    PerBranch,
}

impl AccumulatorScope {
    fn checkpoint(self, accumulator: &Record) -> Option<Record> {
        match self {
            AccumulatorScope::Shared => None,
            AccumulatorScope::PerBranch => Some(accumulator.clone()),
        }
    }
}

/// Which partition field becomes the grouping column's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    #[default]
    Key,
    /// `key_as_string` when the partition has one, `key` otherwise.
    KeyAsString,
}

impl KeyField {
    fn pick(self, partition: &Map<String, Value>) -> Option<&Value> {
        match self {
            KeyField::Key => partition.get(KEY),
            KeyField::KeyAsString => partition
                .get(KEY_AS_STRING)
                .or_else(|| partition.get(KEY)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    pub scope: AccumulatorScope,
    pub key_field: KeyField,
}

/// Builds [`Walk`]s sharing one set of options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Walker {
    options: WalkOptions,
}

impl Walker {
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> WalkOptions {
        self.options
    }

    /// Start a walk over `tree`, extending `accumulator` in place as it goes.
    pub fn walk<'a>(&self, tree: &'a Map<String, Value>, accumulator: &'a mut Record) -> Walk<'a> {
        Walk {
            accumulator,
            stack: vec![Frame::Level {
                entries: tree.iter(),
                partition: false,
            }],
            options: self.options,
        }
    }
}

/// Walk `tree` with default options.
pub fn walk<'a>(tree: &'a Map<String, Value>, accumulator: &'a mut Record) -> Walk<'a> {
    Walker::default().walk(tree, accumulator)
}

enum Frame<'a> {
    /// Node-name/node-body pairs of one level. Inside a partition the key
    /// fields are not part of the sub-tree.
    Level {
        entries: map::Iter<'a>,
        partition: bool,
    },
    Ordered {
        column: &'a str,
        partitions: slice::Iter<'a, Value>,
        base: Option<Record>,
    },
    Labeled {
        column: &'a str,
        partitions: map::Iter<'a>,
        base: Option<Record>,
    },
}

enum Step<'a> {
    Emit(Record),
    Descend(Frame<'a>),
    Ascend,
    Skip,
}

/// Lazy, forward-only sequence of records; one per root-to-leaf path.
pub struct Walk<'a> {
    accumulator: &'a mut Record,
    stack: Vec<Frame<'a>>,
    options: WalkOptions,
}

impl<'a> Walk<'a> {
    fn ascend(&mut self) {
        match self.stack.pop() {
            Some(Frame::Ordered { base: Some(base), .. })
            | Some(Frame::Labeled { base: Some(base), .. }) => *self.accumulator = base,
            _ => {}
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let options = self.options;

        loop {
            let step = match self.stack.last_mut()? {
                Frame::Level { entries, partition } => match entries.next() {
                    None => Step::Ascend,
                    Some((name, _)) if *partition && (name == KEY || name == KEY_AS_STRING) => {
                        Step::Skip
                    }
                    Some((name, body)) => match classify(body) {
                        Node::Ordered(parts) => Step::Descend(Frame::Ordered {
                            column: name.as_str(),
                            partitions: parts.iter(),
                            base: options.scope.checkpoint(self.accumulator),
                        }),
                        Node::Labeled(parts) => Step::Descend(Frame::Labeled {
                            column: name.as_str(),
                            partitions: parts.iter(),
                            base: options.scope.checkpoint(self.accumulator),
                        }),
                        Node::Terminal(value) => {
                            let mut record = self.accumulator.clone();
                            record.insert(name.clone(), value.clone());
                            Step::Emit(record)
                        }
                        Node::Unrecognized => {
                            trace!(node = %name, "skipping node without buckets or value");
                            Step::Skip
                        }
                    },
                },

                Frame::Ordered {
                    column,
                    partitions,
                    base,
                } => match partitions.next() {
                    None => Step::Ascend,
                    Some(partition) => {
                        let keyed = partition
                            .as_object()
                            .and_then(|fields| options.key_field.pick(fields).map(|key| (fields, key)));
                        match keyed {
                            Some((fields, key)) => {
                                if let Some(base) = base {
                                    self.accumulator.clone_from(base);
                                }
                                self.accumulator.insert(column.to_string(), key.clone());
                                Step::Descend(Frame::Level {
                                    entries: fields.iter(),
                                    partition: true,
                                })
                            }
                            None => {
                                trace!(column = %column, "skipping partition without a key");
                                Step::Skip
                            }
                        }
                    }
                },

                Frame::Labeled {
                    column,
                    partitions,
                    base,
                } => match partitions.next() {
                    None => Step::Ascend,
                    Some((label, sub_tree)) => {
                        if let Some(base) = base {
                            self.accumulator.clone_from(base);
                        }
                        self.accumulator
                            .insert(column.to_string(), Value::String(label.clone()));
                        match sub_tree.as_object() {
                            Some(fields) => Step::Descend(Frame::Level {
                                entries: fields.iter(),
                                partition: false,
                            }),
                            None => Step::Skip,
                        }
                    }
                },
            };

            match step {
                Step::Emit(record) => return Some(record),
                Step::Descend(frame) => self.stack.push(frame),
                Step::Ascend => self.ascend(),
                Step::Skip => {}
            }
        }
    }
}

impl<'a> FusedIterator for Walk<'a> {}
