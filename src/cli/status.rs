use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("User:       {}", settings.default_user);
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let transactions: i64 =
            conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let flagged: i64 = conn.query_row(
            "SELECT count(*) FROM transactions WHERE needs_review = 1",
            [],
            |r| r.get(0),
        )?;
        let rules: i64 = conn.query_row("SELECT count(*) FROM rules", [], |r| r.get(0))?;
        let statements: i64 =
            conn.query_row("SELECT count(*) FROM statements", [], |r| r.get(0))?;

        println!();
        println!("Statements:    {statements}");
        println!("Transactions:  {transactions}");
        println!("Needs review:  {flagged}");
        println!("Rules:         {rules}");
    } else {
        println!();
        println!("Database not found. Run `teller init` to set up.");
    }

    Ok(())
}
