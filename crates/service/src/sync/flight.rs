use std::fmt;

use dashmap::DashSet;
use models::TaskId;

use crate::errors::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    Create,
    SetStatus,
    Delete,
}

/// Operation plus target; `create` has no target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlightKey {
    pub mutation: Mutation,
    pub target: Option<TaskId>,
}

impl FlightKey {
    pub fn create() -> Self {
        Self { mutation: Mutation::Create, target: None }
    }

    pub fn set_status(id: TaskId) -> Self {
        Self { mutation: Mutation::SetStatus, target: Some(id) }
    }

    pub fn delete(id: TaskId) -> Self {
        Self { mutation: Mutation::Delete, target: Some(id) }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.mutation {
            Mutation::Create => "create",
            Mutation::SetStatus => "set_status",
            Mutation::Delete => "delete",
        };
        match self.target {
            Some(id) => write!(f, "{op} task {id}"),
            None => write!(f, "{op} task"),
        }
    }
}

/// Rejects a mutation while another one with the same key is still running.
#[derive(Default)]
pub struct SingleFlight {
    in_flight: DashSet<FlightKey>,
}

impl SingleFlight {
    pub fn acquire(&self, key: FlightKey) -> Result<FlightGuard<'_>, ClientError> {
        if !self.in_flight.insert(key) {
            return Err(ClientError::InFlight(key.to_string()));
        }
        Ok(FlightGuard { owner: self, key })
    }

    pub fn is_busy(&self, key: FlightKey) -> bool {
        self.in_flight.contains(&key)
    }
}

/// Releases its key when dropped, whether the mutation succeeded or not.
pub struct FlightGuard<'a> {
    owner: &'a SingleFlight,
    key: FlightKey,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.in_flight.remove(&self.key);
    }
}
