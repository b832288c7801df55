//! HTML fragments swapped into the page by htmx.

use super::{
    auth::User,
    ledger::{Entry, EntryKind},
};

/// Escape text for HTML element and attribute content.
pub(crate) fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// List fragment for the expense or income panel.
pub(crate) fn entries(kind: EntryKind, entries: &[Entry]) -> String {
    let name = kind.singular();
    let mut html = format!("<ul id=\"{name}-list\" class=\"entries\">\n");
    if entries.is_empty() {
        html.push_str(&format!(
            "  <li class=\"empty\">No {} yet</li>\n",
            kind.table()
        ));
    }
    for entry in entries {
        html.push_str(&format!(
            "  <li id=\"{name}-{id}\"><span class=\"amount\">{amount}</span> <span class=\"source\">{source}</span> \
             <button hx-delete=\"/api/v1/{name}/{id}\" hx-target=\"#{name}-list\" hx-swap=\"outerHTML\">Delete</button></li>\n",
            id = entry.id,
            amount = escape(&entry.amount),
            source = escape(&entry.source),
        ));
    }
    html.push_str("</ul>\n");
    html
}

/// Admin view of a single user. The password never leaves the server.
pub(crate) fn user(user: &User) -> String {
    format!(
        "<div class=\"user\">\n  <h2>{}</h2>\n  <p>Admin: {}</p>\n</div>\n",
        escape(&user.username),
        if user.is_admin { "yes" } else { "no" }
    )
}

const CHART_WIDTH: f64 = 400.0;
const CHART_HEIGHT: f64 = 240.0;
const BAR_WIDTH: f64 = 100.0;

/// Bar chart comparing total expenses and incomes.
pub(crate) fn graph(expenses_total: f64, incomes_total: f64) -> String {
    let max = expenses_total.abs().max(incomes_total.abs());
    let bar_height = |value: f64| {
        if max > 0.0 {
            value.abs() / max * (CHART_HEIGHT - 40.0)
        } else {
            0.0
        }
    };
    let expenses_height = bar_height(expenses_total);
    let incomes_height = bar_height(incomes_total);
    let baseline = CHART_HEIGHT - 20.0;

    format!(
        r##"<div id="graph" class="graph">
  <h2>Expenses and Incomes</h2>
  <p class="subtitle">Your Expenses and Incomes</p>
  <svg xmlns="http://www.w3.org/2000/svg" width="{CHART_WIDTH}" height="{CHART_HEIGHT}" role="img" aria-label="Expenses vs Incomes">
    <rect class="bar expenses" x="80" y="{ey:.2}" width="{BAR_WIDTH}" height="{eh:.2}" fill="#c0392b"><title>Expenses: {et:.2}</title></rect>
    <rect class="bar incomes" x="220" y="{iy:.2}" width="{BAR_WIDTH}" height="{ih:.2}" fill="#27ae60"><title>Incomes: {it:.2}</title></rect>
    <line x1="40" y1="{baseline}" x2="360" y2="{baseline}" stroke="#333"/>
    <text x="130" y="{label}" text-anchor="middle">Expenses {et:.2}</text>
    <text x="270" y="{label}" text-anchor="middle">Incomes {it:.2}</text>
  </svg>
</div>
"##,
        ey = baseline - expenses_height,
        eh = expenses_height,
        et = expenses_total,
        iy = baseline - incomes_height,
        ih = incomes_height,
        it = incomes_total,
        label = CHART_HEIGHT - 4.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_specials() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn entries_render_delete_buttons_and_escape() {
        let html = entries(
            EntryKind::Expense,
            &[Entry {
                id: 7,
                amount: "12.50".to_string(),
                source: "<script>".to_string(),
                created_at: 0,
            }],
        );
        assert!(html.starts_with("<ul id=\"expense-list\""));
        assert!(html.contains("hx-delete=\"/api/v1/expense/7\""));
        assert!(html.contains("12.50"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn entries_put_one_item_per_line() {
        let rows: Vec<Entry> = (1..=3)
            .map(|id| Entry {
                id,
                amount: format!("{id}.00"),
                source: "rent".to_string(),
                created_at: 0,
            })
            .collect();
        let html = entries(EntryKind::Expense, &rows);
        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "</ul>");
        for (line, id) in lines[1..4].iter().zip(1..=3) {
            assert!(line.starts_with(&format!("  <li id=\"expense-{id}\">")));
            assert!(line.ends_with("</li>"));
        }
        assert!(html.ends_with("</ul>\n"));
    }

    #[test]
    fn entries_empty_state() {
        let html = entries(EntryKind::Income, &[]);
        assert!(html.contains("No incomes yet"));
        assert_eq!(html.lines().count(), 3);
    }

    #[test]
    fn user_fragment_hides_password() {
        let html = user(&User {
            username: "alice".to_string(),
            password: "pw1".to_string(),
            is_admin: true,
        });
        assert!(html.contains("alice"));
        assert!(html.contains("Admin: yes"));
        assert!(!html.contains("pw1"));
    }

    #[test]
    fn graph_scales_bars_to_largest_total() {
        let html = graph(50.0, 100.0);
        assert!(html.contains("Expenses and Incomes"));
        assert!(html.contains("Your Expenses and Incomes"));
        assert!(html.contains("Expenses: 50.00"));
        assert!(html.contains("Incomes: 100.00"));
        assert!(html.contains("height=\"200.00\""));
        assert!(html.contains("height=\"100.00\""));
    }

    #[test]
    fn graph_handles_empty_ledger() {
        let html = graph(0.0, 0.0);
        assert!(html.contains("height=\"0.00\""));
    }
}
