//! Domain models for the repair-shop desk.
//!
//! Each entity has a stored form (what repositories return), a raw input
//! form (what an operator typed) and a validated form (what repositories
//! accept). Services turn the second into the third.

pub mod customer;
pub mod operator;
pub mod work_order;

pub use customer::{Customer, CustomerChanges, CustomerInput, CustomerPatch, NewCustomer};
pub use operator::{NewOperator, Operator, OperatorInput};
pub use work_order::{
    HardwareProfile, NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderDetail, WorkOrderInput,
    WorkOrderPatch, WorkOrderStats,
};
