//! Line-oriented C text builder and literal formatting.

use crate::layout::{CType, DefaultValue, IntegerLayout, Layout, SizeLayout};
use crate::names::{enum_value, symbol_name};
use crate::types::Value;

/// Accumulates lines at a four-space indentation level.
#[derive(Debug, Default)]
pub struct Writer {
    text: String,
    level: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(level: usize) -> Self {
        Writer {
            text: String::new(),
            level,
        }
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.level {
                self.text.push_str("    ");
            }
            self.text.push_str(line);
        }
        self.text.push('\n');
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    /// Write `line` and indent what follows.
    pub fn open(&mut self, line: impl AsRef<str>) {
        self.line(line);
        self.level += 1;
    }

    /// Dedent and write `line`.
    pub fn close(&mut self, line: impl AsRef<str>) {
        self.level = self.level.saturating_sub(1);
        self.line(line);
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Abort the encoder or decoder named `coder` and leave the function.
    pub fn abort(&mut self, coder: &str, error: &str) {
        self.line(format!("{coder}_abort({coder}_p, {error});"));
        self.blank();
        self.line("return;");
    }

    pub fn abort_if(&mut self, condition: &str, coder: &str, error: &str) {
        self.open(format!("if ({condition}) {{"));
        self.abort(coder, error);
        self.close("}");
        self.blank();
    }

    /// An empty writer one level deeper than this one.
    pub fn nested(&self) -> Writer {
        Writer::with_level(self.level + 1)
    }

    /// Append pre-rendered text verbatim.
    pub fn raw(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn finish(self) -> String {
        self.text
    }
}

/// A C lvalue the generated code reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    expr: String,
    pointer: bool,
}

impl Place {
    /// A pointer parameter such as `src_p`.
    pub fn pointer(name: &str) -> Self {
        Place {
            expr: name.to_string(),
            pointer: true,
        }
    }

    pub fn field(&self, name: &str) -> Place {
        let sep = if self.pointer { "->" } else { "." };
        Place {
            expr: format!("{}{}{}", self.expr, sep, name),
            pointer: false,
        }
    }

    pub fn index(&self, index: &str) -> Place {
        Place {
            expr: format!("{}[{}]", self.expr, index),
            pointer: false,
        }
    }

    /// Address of the value, for passing to `*_inner` functions.
    pub fn address(&self) -> String {
        if self.pointer {
            self.expr.clone()
        } else {
            format!("&{}", self.expr)
        }
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expr)
    }
}

/// C literal of `value` for comparison against or assignment to `c_type`.
pub fn int_literal(value: i128, c_type: CType) -> String {
    if c_type.is_signed() {
        if value == i128::from(i64::MIN) {
            "INT64_MIN".to_string()
        } else if i128::from(i32::MIN) < value && value <= i128::from(i32::MAX) {
            value.to_string()
        } else {
            format!("INT64_C({value})")
        }
    } else {
        uint_literal(value as u64)
    }
}

pub fn uint_literal(value: u64) -> String {
    if value <= u64::from(u32::MAX) {
        format!("{value}u")
    } else {
        format!("UINT64_C({value})")
    }
}

pub fn hex_literal(value: u64) -> String {
    if value <= u64::from(u32::MAX) {
        format!("0x{value:x}u")
    } else {
        format!("UINT64_C(0x{value:x})")
    }
}

/// Two's complement reading of `value` as `uint64_t`.
pub fn wrapping_u64(value: i128) -> u64 {
    value as u64
}

/// C expression that is true when `length` falls outside `size`.
pub fn length_out_of_range(length: &str, size: &SizeLayout) -> String {
    if size.is_fixed() {
        format!("{length} != {}", uint_literal(size.maximum))
    } else if size.minimum > 0 {
        format!(
            "({length} < {}) || ({length} > {})",
            uint_literal(size.minimum),
            uint_literal(size.maximum)
        )
    } else {
        format!("{length} > {}", uint_literal(size.maximum))
    }
}

/// C expression that is true when `value` lies outside the integer range of
/// `layout`, or `None` when the storage type admits no other value.
pub fn value_out_of_range(value: &str, layout: &IntegerLayout) -> Option<String> {
    let mut checks = Vec::new();
    if layout.minimum > layout.c_type.min_value() {
        checks.push(format!("({value} < {})", int_literal(layout.minimum, layout.c_type)));
    }
    if layout.maximum < layout.c_type.max_value() {
        checks.push(format!("({value} > {})", int_literal(layout.maximum, layout.c_type)));
    }
    if checks.is_empty() { None } else { Some(checks.join(" || ")) }
}

/// C literal for a DEFAULT value the resolver has already checked. A
/// member typed by reference gets a compound literal of the referenced
/// struct around the scalar.
pub fn default_literal(namespace: &str, default: &DefaultValue) -> Option<String> {
    let mut literal = scalar_literal(namespace, &default.scalar, &default.value)?;
    for _ in &default.via {
        literal = format!("{{ .value = {literal} }}");
    }
    match default.via.first() {
        Some(outer) => Some(format!("(struct {}_t){literal}", symbol_name(namespace, outer))),
        None => Some(literal),
    }
}

fn scalar_literal(namespace: &str, layout: &Layout, value: &Value) -> Option<String> {
    match (layout, value) {
        (Layout::Boolean, Value::Boolean(v)) => Some(v.to_string()),
        (Layout::Integer(int), Value::Integer(v)) => Some(int_literal(*v, int.c_type)),
        (Layout::Real(_), Value::Real(v)) => Some(format!("{v:?}")),
        (Layout::Real(_), Value::Integer(v)) => Some(format!("{:?}", *v as f64)),
        (Layout::Enumerated(e), Value::Identifier(name)) => Some(enum_value(namespace, &e.path, name)),
        _ => None,
    }
}
