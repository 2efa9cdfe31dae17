/// A "conta": a balance holder with a credit limit, owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub balance: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub user_id: i64,
    pub description: String,
    pub balance: f64,
    pub limit: f64,
}
