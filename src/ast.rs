// ABOUTME: AST node definitions produced by the parser and walked by the evaluator

/// A literal value as it appears in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Void,
}

/// Advisory type annotation on a declaration. Recorded, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Scroll,
    Rune,
    Potion,
    Charm,
    Tome,
    Grimoire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Is,
    Isnt,
    Exceeds,
    Under,
    Atleast,
    Atmost,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// An expression node: what it is, plus where its first token sat.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
    pub column: u32,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32, column: u32) -> Self {
        Expr { kind, line, column }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Lit),
    Identifier(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    TomeLit(Vec<Expr>),
    GrimoireLit(Vec<(Expr, Expr)>),
    Index {
        collection: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        target: Box<Expr>,
        field: String,
    },
}

/// A statement node with the position of its leading token.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
    pub column: u32,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: u32, column: u32) -> Self {
        Stmt { kind, line, column }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl {
        name: String,
        type_hint: Option<TypeHint>,
        value: Expr,
        is_const: bool,
    },
    Assign {
        name: String,
        value: Expr,
    },
    IndexAssign {
        collection: Expr,
        index: Expr,
        value: Expr,
    },
    Delete {
        name: String,
    },
    SpellDecl {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
        auto_speak: bool,
    },
    Cast(Option<Expr>),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        elif_branches: Vec<(Expr, Vec<Stmt>)>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    Expr(Expr),
}

/// The AST root: a program is a statement sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
