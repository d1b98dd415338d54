//! Value model shared by the bundled store backends.
//!
//! Both backends keep one [`StoredValue`] per key and delegate command
//! semantics here, so they answer identically.

use super::{index_range, ReadCommand, ReadReply, WriteCommand};
use crate::error::{PreloadError, PreloadResult};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "sled", derive(bincode::Encode, bincode::Decode))]
pub(crate) enum StoredValue {
    Scalar(String),
    List(Vec<String>),
    Set(BTreeSet<String>),
    /// Kept ordered by ascending score, ties by member
    SortedSet(Vec<(String, f64)>),
    Map(BTreeMap<String, String>),
}

fn wrong_type(key: &str, expected: &str) -> PreloadError {
    PreloadError::WrongType {
        key: key.to_string(),
        expected: expected.to_string(),
    }
}

/// Answer a scalar read.
pub(crate) fn read_scalar(key: &str, current: Option<&StoredValue>) -> PreloadResult<Option<String>> {
    match current {
        None => Ok(None),
        Some(StoredValue::Scalar(value)) => Ok(Some(value.clone())),
        Some(_) => Err(wrong_type(key, "value")),
    }
}

/// Answer one key of a multi-get. Structured values read as absent.
pub(crate) fn read_scalar_lenient(current: Option<&StoredValue>) -> Option<String> {
    match current {
        Some(StoredValue::Scalar(value)) => Some(value.clone()),
        _ => None,
    }
}

/// Answer a read command against the current value of its key.
pub(crate) fn read(command: &ReadCommand, current: Option<&StoredValue>) -> PreloadResult<ReadReply> {
    let Some(current) = current else {
        return Ok(ReadReply::Nil);
    };
    let key = command.key();
    match (command, current) {
        (ReadCommand::Get { .. }, StoredValue::Scalar(value)) => Ok(ReadReply::Value(value.clone())),
        (ReadCommand::Range { start, stop, .. }, StoredValue::List(items)) => {
            Ok(ReadReply::Array(items[index_range(items.len(), *start, *stop)].to_vec()))
        }
        (ReadCommand::Members { .. }, StoredValue::Set(members)) => {
            Ok(ReadReply::Array(members.iter().cloned().collect()))
        }
        (ReadCommand::RangeWithScores { start, stop, .. }, StoredValue::SortedSet(entries)) => Ok(
            ReadReply::ScoredArray(entries[index_range(entries.len(), *start, *stop)].to_vec()),
        ),
        (ReadCommand::Entries { .. }, StoredValue::Map(fields)) => Ok(ReadReply::Pairs(
            fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        (command, _) => Err(wrong_type(
            key,
            match command {
                ReadCommand::Get { .. } => "value",
                ReadCommand::Range { .. } => "list",
                ReadCommand::Members { .. } => "set",
                ReadCommand::RangeWithScores { .. } => "sorted_set",
                ReadCommand::Entries { .. } => "map",
            },
        )),
    }
}

/// Apply a write to the current value of its key.
///
/// Returns the new value (`None` removes the key) and the integer reply.
pub(crate) fn apply(
    command: &WriteCommand,
    current: Option<StoredValue>,
) -> PreloadResult<(Option<StoredValue>, i64)> {
    let key = command.key();
    match command {
        WriteCommand::Set { value, .. } => Ok((Some(StoredValue::Scalar(value.clone())), 1)),
        WriteCommand::IncrBy { by, .. } => {
            let base = match current {
                None => 0,
                Some(StoredValue::Scalar(raw)) => raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| wrong_type(key, "integer"))?,
                Some(_) => return Err(wrong_type(key, "integer")),
            };
            let next = base
                .checked_add(*by)
                .ok_or_else(|| wrong_type(key, "integer within range"))?;
            Ok((Some(StoredValue::Scalar(next.to_string())), next))
        }
        WriteCommand::Push { values, .. } => {
            let mut items = match current {
                None => Vec::new(),
                Some(StoredValue::List(items)) => items,
                Some(_) => return Err(wrong_type(key, "list")),
            };
            items.extend(values.iter().cloned());
            let len = items.len() as i64;
            Ok((Some(StoredValue::List(items)), len))
        }
        WriteCommand::Add { members, .. } => {
            let mut set = match current {
                None => BTreeSet::new(),
                Some(StoredValue::Set(set)) => set,
                Some(_) => return Err(wrong_type(key, "set")),
            };
            let added = members.iter().filter(|m| set.insert((*m).clone())).count() as i64;
            Ok((Some(StoredValue::Set(set)), added))
        }
        WriteCommand::ScoredAdd { member, score, .. } => {
            let mut entries = match current {
                None => Vec::new(),
                Some(StoredValue::SortedSet(entries)) => entries,
                Some(_) => return Err(wrong_type(key, "sorted_set")),
            };
            let before = entries.len();
            entries.retain(|(m, _)| m != member);
            let added = if entries.len() == before { 1 } else { 0 };
            entries.push((member.clone(), *score));
            entries.sort_by(|(ma, sa), (mb, sb)| sa.total_cmp(sb).then_with(|| ma.cmp(mb)));
            Ok((Some(StoredValue::SortedSet(entries)), added))
        }
        WriteCommand::Put { field, value, .. } => {
            let mut fields = match current {
                None => BTreeMap::new(),
                Some(StoredValue::Map(fields)) => fields,
                Some(_) => return Err(wrong_type(key, "map")),
            };
            let added = if fields.insert(field.clone(), value.clone()).is_none() { 1 } else { 0 };
            Ok((Some(StoredValue::Map(fields)), added))
        }
        WriteCommand::Delete { .. } => Ok((None, i64::from(current.is_some()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn run(commands: &[WriteCommand]) -> (Option<StoredValue>, Vec<i64>) {
        let mut current = None;
        let mut replies = Vec::new();
        for command in commands {
            let (next, reply) = apply(command, current.take()).unwrap();
            current = next;
            replies.push(reply);
        }
        (current, replies)
    }

    #[test]
    fn test_incr_from_missing_and_existing() {
        let (value, replies) = run(&[
            WriteCommand::IncrBy { key: "c".into(), by: 10 },
            WriteCommand::IncrBy { key: "c".into(), by: -3 },
        ]);
        assert_eq!(replies, vec![10, 7]);
        assert_eq!(value, Some(StoredValue::Scalar("7".into())));
    }

    #[test]
    fn test_incr_on_non_integer_fails() {
        let err = apply(
            &WriteCommand::IncrBy { key: "c".into(), by: 1 },
            Some(StoredValue::Scalar("abc".into())),
        )
        .unwrap_err();
        assert_matches!(err, PreloadError::WrongType { .. });
    }

    #[test]
    fn test_sorted_set_orders_by_score_and_rescored_member_is_not_new() {
        let (value, replies) = run(&[
            WriteCommand::ScoredAdd { key: "r".into(), member: "bob".into(), score: 200.0 },
            WriteCommand::ScoredAdd { key: "r".into(), member: "alice".into(), score: 100.0 },
            WriteCommand::ScoredAdd { key: "r".into(), member: "bob".into(), score: 50.0 },
        ]);
        assert_eq!(replies, vec![1, 1, 0]);
        assert_eq!(
            value,
            Some(StoredValue::SortedSet(vec![("bob".into(), 50.0), ("alice".into(), 100.0)]))
        );
    }

    #[test]
    fn test_missing_key_reads_nil_for_every_command() {
        let reply = read(&ReadCommand::Members { key: "s".into() }, None).unwrap();
        assert_eq!(reply, ReadReply::Nil);
    }

    #[test]
    fn test_wrong_type_read() {
        let current = StoredValue::List(vec!["a".into()]);
        let err = read(&ReadCommand::Get { key: "l".into() }, Some(&current)).unwrap_err();
        assert_matches!(err, PreloadError::WrongType { expected, .. } if expected == "value");
    }

    #[test]
    fn test_lenient_scalar_read_treats_structured_as_absent() {
        let list = StoredValue::List(vec!["a".into()]);
        assert_eq!(read_scalar_lenient(Some(&list)), None);
        assert_eq!(read_scalar_lenient(Some(&StoredValue::Scalar("5".into()))), Some("5".into()));
        assert_matches!(read_scalar("l", Some(&list)), Err(PreloadError::WrongType { .. }));
    }

    #[test]
    fn test_delete_reports_existence() {
        let (value, replies) = run(&[
            WriteCommand::Set { key: "v".into(), value: "x".into() },
            WriteCommand::Delete { key: "v".into() },
            WriteCommand::Delete { key: "v".into() },
        ]);
        assert_eq!(replies, vec![1, 1, 0]);
        assert_eq!(value, None);
    }
}
