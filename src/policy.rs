//! Read-only policy enforcement over the parsed syntax tree
//!
//! The root of the statement must be a plain query (a select, including
//! compound set-operation selects); everything else is rejected by
//! default, so statement kinds added to the grammar later stay locked out.
//! A second, recursive pass walks every descendant node, because generated
//! text can smuggle a mutating clause inside a CTE, a derived table, a
//! set-operation branch, or an expression subquery.

use sqlparser::ast::{
    Cte, Expr, FunctionArg, FunctionArgExpr, GroupByExpr, JoinConstraint, LimitClause, OrderByKind,
    Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins, With,
};

use crate::error::GatewayError;

/// Rejection reason for roots that are not queries at all.
pub const NOT_A_READ_QUERY: &str = "only read queries are allowed";

/// Rejection reason for mutating operations, at the root or nested.
pub const WRITE_OPERATION: &str = "write operations are not allowed";

/// Check that a statement is a pure read query, all the way down.
///
/// Pure function of the tree: no side effects, no database access. Total
/// over all parseable inputs; the verdict is either acceptance or one of
/// the two fixed rejection reasons.
///
/// # Examples
/// ```
/// # use sqlgate::policy::ensure_read_only;
/// # use sqlgate::parse::parse_single_statement;
/// # use sqlgate::types::Driver;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let select = parse_single_statement("SELECT * FROM users", Driver::Postgres)?;
/// ensure_read_only(&select)?;
///
/// let drop = parse_single_statement("DROP TABLE users", Driver::Postgres)?;
/// assert!(ensure_read_only(&drop).is_err());
/// # Ok(())
/// # }
/// ```
pub fn ensure_read_only(statement: &Statement) -> Result<(), GatewayError> {
    match statement {
        Statement::Query(query) => walk_query(query),
        other if is_mutating_statement(other) => Err(GatewayError::Policy(WRITE_OPERATION)),
        _ => Err(GatewayError::Policy(NOT_A_READ_QUERY)),
    }
}

/// Statement kinds that mutate data or schema. Named explicitly so the
/// rejection reason distinguishes a write attempt from e.g. a SHOW or
/// EXPLAIN, which fail the root allow-list instead.
fn is_mutating_statement(statement: &Statement) -> bool {
    matches!(
        statement,
        Statement::Insert { .. }
            | Statement::Update { .. }
            | Statement::Delete { .. }
            | Statement::Merge { .. }
            | Statement::Truncate { .. }
            | Statement::CreateTable { .. }
            | Statement::CreateView { .. }
            | Statement::CreateIndex { .. }
            | Statement::CreateSchema { .. }
            | Statement::CreateDatabase { .. }
            | Statement::CreateFunction { .. }
            | Statement::CreateProcedure { .. }
            | Statement::CreateRole { .. }
            | Statement::CreateTrigger { .. }
            | Statement::CreateType { .. }
            | Statement::CreateSequence { .. }
            | Statement::CreatePolicy { .. }
            | Statement::AlterTable { .. }
            | Statement::AlterView { .. }
            | Statement::AlterIndex { .. }
            | Statement::AlterRole { .. }
            | Statement::AlterPolicy { .. }
            | Statement::Drop { .. }
            | Statement::DropFunction { .. }
            | Statement::DropProcedure { .. }
            | Statement::DropTrigger { .. }
            | Statement::DropPolicy { .. }
            | Statement::Copy { .. }
            | Statement::CopyIntoSnowflake { .. }
            | Statement::Grant { .. }
            | Statement::Revoke { .. }
            | Statement::Call { .. }
    )
}

/// Walk a query: CTEs, body, ORDER BY, and limit expressions.
fn walk_query(query: &Query) -> Result<(), GatewayError> {
    if let Some(with) = &query.with {
        walk_with(with)?;
    }
    walk_set_expr(&query.body)?;

    if let Some(order_by) = &query.order_by {
        match &order_by.kind {
            OrderByKind::Expressions(exprs) => {
                for order_expr in exprs {
                    walk_expr(&order_expr.expr)?;
                }
            }
            OrderByKind::All(_) => {}
        }
    }
    if let Some(limit_clause) = &query.limit_clause {
        walk_limit_clause(limit_clause)?;
    }
    if let Some(fetch) = &query.fetch
        && let Some(quantity) = &fetch.quantity
    {
        walk_expr(quantity)?;
    }

    Ok(())
}

fn walk_with(with: &With) -> Result<(), GatewayError> {
    for cte in &with.cte_tables {
        walk_cte(cte)?;
    }
    Ok(())
}

fn walk_cte(cte: &Cte) -> Result<(), GatewayError> {
    // A CTE carries a full query, which may itself nest further CTEs
    walk_query(&cte.query)
}

fn walk_limit_clause(limit_clause: &LimitClause) -> Result<(), GatewayError> {
    match limit_clause {
        LimitClause::LimitOffset {
            limit,
            offset,
            limit_by,
        } => {
            if let Some(limit) = limit {
                walk_expr(limit)?;
            }
            if let Some(offset) = offset {
                walk_expr(&offset.value)?;
            }
            for expr in limit_by {
                walk_expr(expr)?;
            }
        }
        LimitClause::OffsetCommaLimit { offset, limit } => {
            walk_expr(offset)?;
            walk_expr(limit)?;
        }
    }
    Ok(())
}

/// Walk a query body or set-operation branch. The grammar allows DML to
/// appear directly as a set expression (e.g. inside a CTE or a UNION arm);
/// those are the nodes the recursive check exists to catch.
fn walk_set_expr(set_expr: &SetExpr) -> Result<(), GatewayError> {
    match set_expr {
        SetExpr::Select(select) => walk_select(select),
        SetExpr::Query(query) => walk_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left)?;
            walk_set_expr(right)
        }
        SetExpr::Values(values) => {
            for row in &values.rows {
                for expr in row {
                    walk_expr(expr)?;
                }
            }
            Ok(())
        }
        SetExpr::Table(_) => Ok(()),
        SetExpr::Insert(_) | SetExpr::Update(_) | SetExpr::Delete(_) | SetExpr::Merge(_) => {
            Err(GatewayError::Policy(WRITE_OPERATION))
        }
    }
}

fn walk_select(select: &Select) -> Result<(), GatewayError> {
    for item in &select.projection {
        walk_select_item(item)?;
    }
    for table_with_joins in &select.from {
        walk_table_with_joins(table_with_joins)?;
    }
    if let Some(expr) = &select.selection {
        walk_expr(expr)?;
    }
    if let Some(expr) = &select.having {
        walk_expr(expr)?;
    }
    if let Some(expr) = &select.qualify {
        walk_expr(expr)?;
    }
    if let Some(expr) = &select.prewhere {
        walk_expr(expr)?;
    }
    walk_group_by(&select.group_by)?;
    for expr in &select.cluster_by {
        walk_expr(expr)?;
    }
    for expr in &select.distribute_by {
        walk_expr(expr)?;
    }
    for order_expr in &select.sort_by {
        walk_expr(&order_expr.expr)?;
    }
    Ok(())
}

fn walk_select_item(item: &SelectItem) -> Result<(), GatewayError> {
    match item {
        SelectItem::UnnamedExpr(expr) => walk_expr(expr),
        SelectItem::ExprWithAlias { expr, .. } => walk_expr(expr),
        SelectItem::QualifiedWildcard(..) | SelectItem::Wildcard(..) => Ok(()),
    }
}

fn walk_group_by(group_by: &GroupByExpr) -> Result<(), GatewayError> {
    match group_by {
        GroupByExpr::All(..) => Ok(()),
        GroupByExpr::Expressions(exprs, ..) => {
            for expr in exprs {
                walk_expr(expr)?;
            }
            Ok(())
        }
    }
}

fn walk_table_with_joins(table_with_joins: &TableWithJoins) -> Result<(), GatewayError> {
    walk_table_factor(&table_with_joins.relation)?;

    for join in &table_with_joins.joins {
        walk_table_factor(&join.relation)?;

        use sqlparser::ast::JoinOperator;
        match &join.join_operator {
            JoinOperator::Inner(constraint)
            | JoinOperator::Left(constraint)
            | JoinOperator::LeftOuter(constraint)
            | JoinOperator::Right(constraint)
            | JoinOperator::RightOuter(constraint)
            | JoinOperator::FullOuter(constraint)
            | JoinOperator::Semi(constraint)
            | JoinOperator::LeftSemi(constraint)
            | JoinOperator::RightSemi(constraint)
            | JoinOperator::Anti(constraint)
            | JoinOperator::LeftAnti(constraint)
            | JoinOperator::RightAnti(constraint) => {
                if let JoinConstraint::On(expr) = constraint {
                    walk_expr(expr)?;
                }
            }
            JoinOperator::AsOf {
                match_condition,
                constraint,
            } => {
                walk_expr(match_condition)?;
                if let JoinConstraint::On(expr) = constraint {
                    walk_expr(expr)?;
                }
            }
            _ => {
                // cross joins and apply forms carry no constraint expression
            }
        }
    }

    Ok(())
}

fn walk_table_factor(factor: &TableFactor) -> Result<(), GatewayError> {
    match factor {
        TableFactor::Table { .. } => Ok(()),
        TableFactor::Derived { subquery, .. } => walk_query(subquery),
        TableFactor::Function { args, .. } => {
            for arg in args {
                walk_function_arg(arg)?;
            }
            Ok(())
        }
        TableFactor::UNNEST { array_exprs, .. } => {
            for expr in array_exprs {
                walk_expr(expr)?;
            }
            Ok(())
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => walk_table_with_joins(table_with_joins),
        TableFactor::Pivot { table, .. } | TableFactor::Unpivot { table, .. } => {
            walk_table_factor(table)
        }
        _ => Ok(()),
    }
}

fn walk_function_arg(arg: &FunctionArg) -> Result<(), GatewayError> {
    match arg {
        FunctionArg::Unnamed(arg_expr)
        | FunctionArg::Named { arg: arg_expr, .. }
        | FunctionArg::ExprNamed { arg: arg_expr, .. } => {
            if let FunctionArgExpr::Expr(expr) = arg_expr {
                walk_expr(expr)?;
            }
            Ok(())
        }
    }
}

fn walk_expr(expr: &Expr) -> Result<(), GatewayError> {
    match expr {
        // Expression subqueries are full queries in their own right
        Expr::Subquery(query) => walk_query(query),
        Expr::InSubquery { subquery, expr, .. } => {
            walk_expr(expr)?;
            walk_query(subquery)
        }
        Expr::Exists { subquery, .. } => walk_query(subquery),

        Expr::BinaryOp { left, right, .. } => {
            walk_expr(left)?;
            walk_expr(right)
        }
        Expr::UnaryOp { expr, .. } => walk_expr(expr),
        Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
            walk_expr(left)?;
            walk_expr(right)
        }
        Expr::Cast { expr, .. } => walk_expr(expr),
        Expr::Extract { expr, .. } => walk_expr(expr),
        Expr::Substring {
            expr,
            substring_from,
            substring_for,
            ..
        } => {
            walk_expr(expr)?;
            if let Some(from_expr) = substring_from {
                walk_expr(from_expr)?;
            }
            if let Some(for_expr) = substring_for {
                walk_expr(for_expr)?;
            }
            Ok(())
        }
        Expr::Nested(expr) => walk_expr(expr),
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(expr) = operand {
                walk_expr(expr)?;
            }
            for case_when in conditions {
                walk_expr(&case_when.condition)?;
                walk_expr(&case_when.result)?;
            }
            if let Some(expr) = else_result {
                walk_expr(expr)?;
            }
            Ok(())
        }
        Expr::Function(func) => {
            use sqlparser::ast::FunctionArguments;
            match &func.args {
                FunctionArguments::List(arg_list) => {
                    for arg in &arg_list.args {
                        walk_function_arg(arg)?;
                    }
                    Ok(())
                }
                FunctionArguments::Subquery(query) => walk_query(query),
                FunctionArguments::None => Ok(()),
            }
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr)?;
            for item in list {
                walk_expr(item)?;
            }
            Ok(())
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(expr)?;
            walk_expr(low)?;
            walk_expr(high)
        }
        Expr::Like { expr, pattern, .. }
        | Expr::ILike { expr, pattern, .. }
        | Expr::SimilarTo { expr, pattern, .. } => {
            walk_expr(expr)?;
            walk_expr(pattern)
        }
        Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::IsTrue(expr)
        | Expr::IsNotTrue(expr)
        | Expr::IsFalse(expr)
        | Expr::IsNotFalse(expr)
        | Expr::IsUnknown(expr)
        | Expr::IsNotUnknown(expr) => walk_expr(expr),
        Expr::InUnnest {
            expr, array_expr, ..
        } => {
            walk_expr(expr)?;
            walk_expr(array_expr)
        }
        Expr::Tuple(exprs) => {
            for expr in exprs {
                walk_expr(expr)?;
            }
            Ok(())
        }
        Expr::Array(array) => {
            for expr in &array.elem {
                walk_expr(expr)?;
            }
            Ok(())
        }

        // Literals and column references carry no nested queries
        Expr::Identifier(..)
        | Expr::CompoundIdentifier(..)
        | Expr::Value(..)
        | Expr::TypedString { .. }
        | Expr::Interval { .. } => Ok(()),

        // Remaining expression kinds cannot embed a statement; subqueries
        // they may carry are Query nodes reached through the arms above
        _ => Ok(()),
    }
}
