//! Plain-text rendering of desk records for the terminal.
//!
//! Formatting functions return strings so they can be tested; [`line`] is
//! the only place that writes to stdout.

use std::fmt::Write as _;

use workbench_core::{WorkOrderStatus, format_phone};
use workbench_desk::models::{Customer, Operator, WorkOrder, WorkOrderDetail, WorkOrderStats};

const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Print one line (or block) to stdout.
#[allow(clippy::print_stdout)]
pub fn line(text: &str) {
    println!("{text}");
}

/// One row per customer.
pub fn customer_table(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No customers found".to_owned();
    }
    let mut out = format!("{:>5}  {:<32}  {:<14}  {}", "ID", "NAME", "CPF", "PHONE");
    for c in customers {
        let _ = write!(
            out,
            "\n{:>5}  {:<32}  {:<14}  {}",
            c.id.to_string(),
            c.full_name(),
            c.cpf.as_str(),
            format_phone(&c.phone)
        );
    }
    out
}

/// Full customer record.
pub fn customer_detail(customer: &Customer) -> String {
    let mut out = format!(
        "Customer {}\n  Name:    {}\n  CPF:     {}\n  Phone:   {}",
        customer.id,
        customer.full_name(),
        customer.cpf,
        format_phone(&customer.phone)
    );
    if let Some(email) = &customer.email {
        let _ = write!(out, "\n  Email:   {email}");
    }
    let _ = write!(
        out,
        "\n  Since:   {}",
        customer.created_at.format(DATE_TIME_FORMAT)
    );
    out
}

/// One row per operator.
pub fn operator_table(operators: &[Operator]) -> String {
    if operators.is_empty() {
        return "No operators found".to_owned();
    }
    let mut out = format!("{:>5}  {:<16}  {:<28}  {:<8}  {}", "ID", "USERNAME", "NAME", "ACTIVE", "EMAIL");
    for o in operators {
        let _ = write!(
            out,
            "\n{:>5}  {:<16}  {:<28}  {:<8}  {}",
            o.id.to_string(),
            o.username,
            o.display_name,
            if o.active { "yes" } else { "no" },
            o.email
        );
    }
    out
}

/// One row per work order.
pub fn order_table(orders: &[WorkOrderDetail]) -> String {
    if orders.is_empty() {
        return "No work orders found".to_owned();
    }
    let mut out = format!(
        "{:<8}  {:<16}  {:<11}  {:<28}  {}",
        "NUMBER", "OPENED", "STATUS", "CUSTOMER", "FAULT"
    );
    for d in orders {
        let _ = write!(
            out,
            "\n{:<8}  {:<16}  {:<11}  {:<28}  {}",
            d.order.number,
            d.order.created_at.format(DATE_TIME_FORMAT).to_string(),
            d.order.status.label(),
            d.customer_full_name(),
            first_line(&d.order.reported_fault)
        );
    }
    out
}

/// Full work-order record, notes included.
pub fn order_detail(detail: &WorkOrderDetail) -> String {
    let order = &detail.order;
    let mut out = format!(
        "Work order {} (id {})\n  Status:    {}\n  Opened:    {}\n  Operator:  {}\n  Customer:  {} ({})",
        order.number,
        order.id,
        order.status.label(),
        order.created_at.format(DATE_TIME_FORMAT),
        detail.operator_name,
        detail.customer_full_name(),
        detail.customer_cpf
    );
    order_extras(&mut out, order);
    out
}

/// Short summary after a write.
pub fn order_summary(order: &WorkOrder) -> String {
    let mut out = format!("Work order {}: {}", order.number, order.status.label());
    if let Some(done) = order.completed_at {
        let _ = write!(out, " on {}", done.format(DATE_TIME_FORMAT));
    }
    out
}

fn order_extras(out: &mut String, order: &WorkOrder) {
    if let Some(price) = order.estimated_price {
        let _ = write!(out, "\n  Price:     {price}");
    }
    if let Some(due) = order.due_date {
        let _ = write!(out, "\n  Due:       {}", due.format("%d/%m/%Y"));
    }
    if let Some(done) = order.completed_at {
        let _ = write!(out, "\n  Completed: {}", done.format(DATE_TIME_FORMAT));
    }
    for (label, value) in order.hardware.entries() {
        let _ = write!(out, "\n  {label}: {value}");
    }
    let _ = write!(out, "\n  Fault:\n    {}", indent(&order.reported_fault));
    if let Some(notes) = order.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = write!(out, "\n  Notes:\n    {}", indent(notes));
    }
}

/// Counts per status.
pub fn stats(stats: &WorkOrderStats) -> String {
    let mut out = format!("Total: {}", stats.total);
    for status in WorkOrderStatus::ALL {
        let _ = write!(out, "\n  {:<12} {}", status.label(), stats.count(status));
    }
    out
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn indent(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\n    ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tables() {
        assert_eq!(customer_table(&[]), "No customers found");
        assert_eq!(order_table(&[]), "No work orders found");
    }

    #[test]
    fn test_stats_lists_every_status() {
        let text = stats(&WorkOrderStats {
            total: 3,
            open: 1,
            in_progress: 0,
            completed: 2,
            cancelled: 0,
        });
        assert!(text.starts_with("Total: 3"));
        assert!(text.contains("In Progress"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_indent_and_first_line() {
        assert_eq!(first_line("Não liga\nCheiro de queimado"), "Não liga");
        assert_eq!(first_line(""), "");
        assert_eq!(indent("a\n\nb"), "a\n    \n    b");
    }
}
