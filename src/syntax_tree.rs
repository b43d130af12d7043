use crate::SyntaxTree;
use ptree::TreeItem;
use std::fmt::{Debug, Formatter};

impl SyntaxTree {
    /// Create an interior node for a reduced production.
    pub fn new(symbol: String, start: usize, end: usize, children: Vec<SyntaxTree>) -> Self {
        Self {
            symbol,
            lexeme: None,
            start,
            end,
            children,
        }
    }

    /// Create a leaf node for a shifted terminal.
    pub fn leaf(symbol: String, lexeme: String, start: usize, end: usize) -> Self {
        Self {
            symbol,
            lexeme: Some(lexeme),
            start,
            end,
            children: Vec::with_capacity(0),
        }
    }

    /// Whether any node of the tree is labelled with the given symbol.
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbol == symbol || self.children.iter().any(|c| c.contains(symbol))
    }

    /// Print the tree to the standard output.
    pub fn print(&self) -> std::io::Result<()> {
        ptree::print_tree(self)
    }
}

impl Debug for SyntaxTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = f.debug_struct("SyntaxTree");
        debug_struct
            .field("symbol", &self.symbol)
            .field("start", &self.start)
            .field("end", &self.end);
        if let Some(lexeme) = &self.lexeme {
            debug_struct.field("lexeme", lexeme);
        }
        if self.children.len() > 0 {
            debug_struct.field("children", &self.children);
        }
        debug_struct.finish()
    }
}

impl TreeItem for SyntaxTree {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match &self.lexeme {
            Some(lexeme) => write!(f, "{} {:?} # {}-{}", self.symbol, lexeme, self.start, self.end),
            None => write!(f, "{} # {}-{}", self.symbol, self.start, self.end),
        }
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(&self.children)
    }
}
