//! An in-memory [`Driver`] for tests: records every query and parameter
//! table it receives and returns pre-scripted result rows, with no live
//! backend required. This is the test collaborator the BGP/algebra
//! compiler and write-buffer conformance tests are built against.

use crate::driver::{BackendValue, Driver, Rows};
use crate::error::StorageResult;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};

/// One query the driver observed: the Cypher text and the parameter table
/// it was issued with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    /// The Cypher text passed to [`Driver::execute`].
    pub cypher: String,
    /// The parameter table passed alongside it.
    pub parameters: BTreeMap<String, BackendValue>,
}

/// A scriptable, query-recording [`Driver`].
///
/// Responses are consumed in FIFO order as [`Driver::execute`] is called;
/// once exhausted, further calls return an empty row set rather than an
/// error, since most tests care only about the queries issued, not a
/// realistic error path.
pub struct MockDriver {
    state: Mutex<MockState>,
}

struct MockState {
    recorded: Vec<RecordedQuery>,
    responses: VecDeque<Rows>,
}

impl MockDriver {
    /// Build an empty mock driver with no scripted responses.
    pub fn new() -> Self {
        MockDriver {
            state: Mutex::new(MockState {
                recorded: Vec::new(),
                responses: VecDeque::new(),
            }),
        }
    }

    /// Queue a response to be returned by the next [`Driver::execute`] call.
    pub fn push_response(&self, rows: Rows) {
        self.state.lock().responses.push_back(rows);
    }

    /// All queries issued so far, in call order.
    pub fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.state.lock().recorded.clone()
    }

    /// The Cypher text of the most recent query issued, if any.
    pub fn last_cypher(&self) -> Option<String> {
        self.state.lock().recorded.last().map(|q| q.cypher.clone())
    }

    /// Number of queries issued so far.
    pub fn query_count(&self) -> usize {
        self.state.lock().recorded.len()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MockDriver {
    fn execute(
        &self,
        cypher: &str,
        parameters: &BTreeMap<String, BackendValue>,
    ) -> StorageResult<Rows> {
        let mut state = self.state.lock();
        state.recorded.push(RecordedQuery {
            cypher: cypher.to_string(),
            parameters: parameters.clone(),
        });
        Ok(state.responses.pop_front().unwrap_or_default())
    }

    fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Row;

    #[test]
    fn test_records_issued_queries_and_parameters() {
        let driver = MockDriver::new();
        let mut params = BTreeMap::new();
        params.insert("p0".to_string(), BackendValue::String("x".into()));

        driver.execute("MATCH (n) RETURN n", &params).unwrap();

        let recorded = driver.recorded_queries();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].cypher, "MATCH (n) RETURN n");
        assert_eq!(recorded[0].parameters, params);
    }

    #[test]
    fn test_scripted_responses_consumed_in_order() {
        let driver = MockDriver::new();
        driver.push_response(vec![Row::new(vec![(
            "n".to_string(),
            BackendValue::Integer(1),
        )])]);
        driver.push_response(vec![]);

        let first = driver.execute("Q1", &BTreeMap::new()).unwrap();
        assert_eq!(first.len(), 1);

        let second = driver.execute("Q2", &BTreeMap::new()).unwrap();
        assert!(second.is_empty());

        let third = driver.execute("Q3", &BTreeMap::new()).unwrap();
        assert!(third.is_empty());

        assert_eq!(driver.query_count(), 3);
    }
}
