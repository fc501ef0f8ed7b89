//! Console table of scraped tasks.

use tasklink_core::TaskRecord;

const RULE_WIDTH: usize = 100;

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Render tasks as a fixed-width table.
#[must_use]
pub fn format_tasks_table(tasks: &[TaskRecord]) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let mut lines = Vec::with_capacity(tasks.len() + 5);
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!(
        "{:<10} | {:<20} | {:<20} | {:<10} | {:<15}",
        "ID", "Domain", "Customer", "Price", "Time"
    ));
    lines.push("-".repeat(RULE_WIDTH));

    for task in tasks {
        let price = format!("${:.2}", task.price);
        lines.push(format!(
            "{:<10} | {:<20} | {:<20} | {:<10} | {:<15}",
            clip(&task.task_id.to_string(), 10),
            clip(&task.domain, 20),
            clip(&task.customer, 20),
            clip(&price, 10),
            clip(&task.time_passed, 15),
        ));
    }

    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!("Total: {} tasks", tasks.len()));
    lines.join("\n")
}

/// Print the table to stdout.
pub fn print_tasks(tasks: &[TaskRecord]) {
    println!("\n{}\n", format_tasks_table(tasks));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tasklink_core::TaskId;

    fn task(id: u64, domain: &str, price: &str) -> TaskRecord {
        TaskRecord {
            task_id: TaskId::new(id),
            domain: domain.to_string(),
            customer: "Acme".to_string(),
            customer_url: String::new(),
            external_links: 1,
            title: "Title".to_string(),
            time_passed: "3 дня назад".to_string(),
            price: Decimal::from_str(price).expect("decimal"),
        }
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(format_tasks_table(&[]), "No tasks found.");
    }

    #[test]
    fn test_table_layout() {
        let table = format_tasks_table(&[
            task(123_456, "example.com", "150"),
            task(7, "a-very-long-domain-name.example.org", "0.5"),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "=".repeat(100));
        assert!(lines[1].starts_with("ID         | Domain"));
        assert_eq!(lines[2], "-".repeat(100));
        assert!(lines[3].starts_with("123456     | example.com          | Acme"));
        assert!(lines[3].contains("| $150.00    |"));
        assert!(lines[4].contains("| a-very-long-domain-n |"));
        assert!(lines[4].contains("| $0.50      |"));
        assert_eq!(lines[6], "Total: 2 tasks");
    }
}
