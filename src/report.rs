use std::fmt::Write as _;
use std::io::{self, Write};

use crate::stats::{Field, Snapshot};

const FIELD_PADDING: &str = "   ";

fn field_text(field: &Field) -> String {
    match field {
        Field::Percentile { target, value } => format!("p{:.0} = {:.2}", target, value),
        Field::Mean(v) => format!("Mean = {:.2}", v),
        Field::Max(v) => format!("Max = {:.2}", v),
    }
}

/// Renders a snapshot as `| <field>   | <field>   |`, newline-terminated.
pub fn render_line(snapshot: &Snapshot) -> String {
    let mut line = String::from("|");
    for field in &snapshot.fields {
        let _ = write!(line, " {}{}|", field_text(field), FIELD_PADDING);
    }
    line.push('\n');
    line
}

pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &Snapshot) -> io::Result<()> {
    out.write_all(render_line(snapshot).as_bytes())?;
    out.flush()
}
