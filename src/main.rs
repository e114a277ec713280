// VivaaTown - Command Line
// Teacher-side administration of a classroom economy backed by one SQLite file.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use vivaa_town::logging::init_logging;
use vivaa_town::{migrate_legacy, MarketNews, PriceChange, SavingsKind, Storage, StorageArgs, Town};

#[derive(Debug, Parser)]
#[command(name = "vivaa-town", version, about = "Classroom economy administration")]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create, list and remove classrooms
    #[command(subcommand)]
    Classroom(ClassroomCmd),
    /// Roster, balances and the ledger
    #[command(subcommand)]
    Student(StudentCmd),
    /// Jobs and assignments
    #[command(subcommand)]
    Job(JobCmd),
    /// Pay every assigned student, withholding tax
    Payroll { classroom: String },
    /// Savings products and accounts
    #[command(subcommand)]
    Savings(SavingsCmd),
    /// Stocks and trading
    #[command(subcommand)]
    Stock(StockCmd),
    /// Price ticks and news
    #[command(subcommand)]
    Market(MarketCmd),
    /// Achievement definitions and awards
    #[command(subcommand)]
    Achievement(AchievementCmd),
    /// Copy legacy storage keys into the current format (runs once)
    Migrate,
    /// Money picture for a classroom
    Summary {
        classroom: String,
        /// Valuation date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Subcommand)]
enum ClassroomCmd {
    Create {
        name: String,
        teacher: String,
        #[arg(long, default_value_t = 10.0)]
        tax_rate: f64,
        #[arg(long)]
        currency: Option<String>,
    },
    List,
    SetTax { id: String, rate: f64 },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum StudentCmd {
    Add {
        classroom: String,
        name: String,
        #[arg(long, default_value = "")]
        number: String,
        #[arg(long, default_value_t = 0.0)]
        balance: f64,
    },
    List { classroom: String },
    /// CSV with Name, Number, Balance columns
    Import { classroom: String, file: PathBuf },
    /// Write the classroom ledger as CSV (stdout when no file is given)
    ExportLedger {
        classroom: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Grant { student: String, amount: f64, reason: String },
    Fine { student: String, amount: f64, reason: String },
    SetCredit { student: String, score: u16 },
}

#[derive(Debug, Subcommand)]
enum JobCmd {
    Create {
        classroom: String,
        title: String,
        salary: f64,
        #[arg(long, default_value_t = 1)]
        positions: u32,
        #[arg(long, default_value = "")]
        description: String,
    },
    List { classroom: String },
    Assign { job: String, student: String },
    Unassign { student: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Deposit,
    Savings,
}

impl From<KindArg> for SavingsKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Deposit => SavingsKind::Deposit,
            KindArg::Savings => SavingsKind::Savings,
        }
    }
}

#[derive(Debug, Subcommand)]
enum SavingsCmd {
    /// Add a product to the classroom catalogue
    Product {
        classroom: String,
        name: String,
        #[arg(value_enum)]
        kind: KindArg,
        /// Base annual rate in percent
        rate: f64,
        /// Term in months
        term: u32,
        #[arg(long, default_value_t = 0.0)]
        min_amount: f64,
    },
    Products { classroom: String },
    Open {
        student: String,
        product: String,
        amount: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Contribute { account: String, amount: f64 },
    Quote {
        account: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Withdraw {
        account: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    List { student: String },
}

#[derive(Debug, Subcommand)]
enum StockCmd {
    List { classroom: String },
    Add {
        classroom: String,
        symbol: String,
        name: String,
        price: f64,
        /// Largest fraction a tick may move the price (0.0 to 1.0)
        #[arg(long)]
        volatility: Option<f64>,
    },
    /// Remove a listing; existing holdings are no longer valued
    Delist { stock: String },
    Buy { student: String, stock: String, quantity: u32 },
    Sell { student: String, stock: String, quantity: u32 },
    Portfolio { student: String },
}

#[derive(Debug, Subcommand)]
enum MarketCmd {
    /// Move every price in the classroom randomly
    Tick { classroom: String },
    /// Publish a headline; without --stock it moves the whole market
    News {
        classroom: String,
        headline: String,
        /// Percent move, e.g. -10
        #[arg(allow_hyphen_values = true)]
        impact: f64,
        #[arg(long)]
        stock: Option<String>,
        #[arg(long, default_value = "")]
        body: String,
    },
    Feed { classroom: String },
}

#[derive(Debug, Subcommand)]
enum AchievementCmd {
    Create {
        classroom: String,
        name: String,
        reward: f64,
        #[arg(long, default_value_t = 0)]
        credit_bonus: u16,
        #[arg(long, default_value = "")]
        description: String,
    },
    List { classroom: String },
    Award { achievement: String, student: String },
}

fn main() -> Result<()> {
    init_logging("warn")?;
    let cli = Cli::parse();

    let config = cli.storage.economy()?;
    let storage = Storage::open(&cli.storage.db_path)
        .with_context(|| format!("failed to open {}", cli.storage.db_path.display()))?;

    if let Command::Migrate = cli.command {
        let report = migrate_legacy(&storage)?;
        if report.already_migrated {
            println!("Legacy data already migrated");
        } else {
            println!(
                "✓ Migrated {} classrooms, {} students ({} skipped)",
                report.classrooms, report.students, report.skipped
            );
        }
        return Ok(());
    }

    let mut town = Town::load(&storage, config)?;
    run(&mut town, cli.command)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn print_changes(changes: &[PriceChange]) {
    for c in changes {
        println!(
            "  {:<6} {:>8.2} → {:>8.2} ({:+.1}%)",
            c.symbol,
            c.old_price,
            c.new_price,
            c.change_percent()
        );
    }
}

fn run(town: &mut Town, command: Command) -> Result<()> {
    match command {
        Command::Classroom(cmd) => classroom(town, cmd),
        Command::Student(cmd) => student(town, cmd),
        Command::Job(cmd) => job(town, cmd),
        Command::Payroll { classroom } => {
            let report = town.jobs.run_payroll(
                &classroom,
                &mut town.classrooms,
                &mut town.students,
                &mut town.ledger,
            )?;
            println!(
                "✓ Paid {} students: gross {:.2}, tax {:.2}, net {:.2}",
                report.students_paid, report.gross, report.tax, report.net
            );
            if !report.skipped.is_empty() {
                println!("  Skipped missing students: {}", report.skipped.join(", "));
            }
            Ok(())
        }
        Command::Savings(cmd) => savings(town, cmd),
        Command::Stock(cmd) => stock(town, cmd),
        Command::Market(cmd) => market(town, cmd),
        Command::Achievement(cmd) => achievement(town, cmd),
        Command::Migrate => Ok(()),
        Command::Summary { classroom, date } => {
            let as_of = date.unwrap_or_else(today);
            town.savings.refresh_maturities(as_of)?;
            let s = town.summary(&classroom, as_of)?;
            println!("📊 Classroom {} as of {}", s.classroom_id, as_of);
            println!("  Students:      {}", s.student_count);
            println!("  Cash:          {:>10.2}", s.cash);
            println!("  Savings:       {:>10.2}", s.savings);
            println!("  Stocks:        {:>10.2}", s.stocks);
            println!("  Treasury:      {:>10.2}", s.treasury);
            println!("  Total wealth:  {:>10.2}", s.total_wealth());
            println!("  Avg credit:    {:>10.0}", s.average_credit_score);
            Ok(())
        }
    }
}

fn classroom(town: &mut Town, cmd: ClassroomCmd) -> Result<()> {
    match cmd {
        ClassroomCmd::Create { name, teacher, tax_rate, currency } => {
            let room = town.classrooms.create(&name, &teacher, tax_rate)?;
            let room = match currency {
                Some(currency) => {
                    let room = room.with_currency(&currency);
                    town.classrooms.update(room.clone())?;
                    room
                }
                None => room,
            };
            println!("✓ Created classroom {} ({})", room.name, room.id);
        }
        ClassroomCmd::List => {
            for room in town.classrooms.list() {
                println!(
                    "{}  {:<20} {:<16} tax {:>5.1}%  treasury {:>10.2} {}",
                    room.id, room.name, room.teacher_name, room.tax_rate, room.treasury, room.currency_name
                );
            }
        }
        ClassroomCmd::SetTax { id, rate } => {
            let room = town.classrooms.set_tax_rate(&id, rate)?;
            println!("✓ {} tax rate is now {:.1}%", room.name, room.tax_rate);
        }
        ClassroomCmd::Delete { id } => {
            let room = town.classrooms.delete(&id)?;
            println!("✓ Deleted classroom {}", room.name);
        }
    }
    Ok(())
}

fn student(town: &mut Town, cmd: StudentCmd) -> Result<()> {
    match cmd {
        StudentCmd::Add { classroom, name, number, balance } => {
            town.classrooms.require(&classroom)?;
            let s = town.students.add(&classroom, &name, &number, balance)?;
            println!("✓ Added {} ({})", s.name, s.id);
        }
        StudentCmd::List { classroom } => {
            for s in town.students.list_for_classroom(&classroom) {
                println!(
                    "{}  {:<20} {:>10.2}  credit {} ({})",
                    s.id,
                    s.name,
                    s.balance,
                    s.credit_score,
                    s.credit_grade()
                );
            }
        }
        StudentCmd::Import { classroom, file } => {
            town.classrooms.require(&classroom)?;
            let reader =
                File::open(&file).with_context(|| format!("failed to open {}", file.display()))?;
            let result = town.students.import_roster(&classroom, reader)?;
            println!("✓ Imported {} students ({} skipped)", result.imported, result.skipped);
        }
        StudentCmd::ExportLedger { classroom, out } => {
            let rows = match out {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    town.ledger.export_csv(&classroom, file)?
                }
                None => town.ledger.export_csv(&classroom, io::stdout().lock())?,
            };
            eprintln!("✓ Exported {} ledger rows", rows);
        }
        StudentCmd::Grant { student, amount, reason } => {
            let s = town.bank.grant(&student, amount, &reason, &mut town.students, &mut town.ledger)?;
            println!("✓ {} balance is now {:.2}", s.name, s.balance);
        }
        StudentCmd::Fine { student, amount, reason } => {
            let s = town.bank.fine(
                &student,
                amount,
                &reason,
                &mut town.students,
                &mut town.classrooms,
                &mut town.ledger,
            )?;
            println!("✓ {} balance is now {:.2}", s.name, s.balance);
        }
        StudentCmd::SetCredit { student, score } => {
            let s = town.bank.set_credit_score(&student, score, &mut town.students)?;
            println!("✓ {} credit score {} ({})", s.name, s.credit_score, s.credit_grade());
        }
    }
    Ok(())
}

fn job(town: &mut Town, cmd: JobCmd) -> Result<()> {
    match cmd {
        JobCmd::Create { classroom, title, salary, positions, description } => {
            town.classrooms.require(&classroom)?;
            let job = town.jobs.create(&classroom, &title, &description, salary, positions)?;
            println!("✓ Created job {} ({})", job.title, job.id);
        }
        JobCmd::List { classroom } => {
            for job in town.jobs.list_for_classroom(&classroom) {
                println!(
                    "{}  {:<20} {:>8.2}  {}/{} filled",
                    job.id,
                    job.title,
                    job.salary,
                    job.assigned_student_ids.len(),
                    job.max_positions
                );
            }
        }
        JobCmd::Assign { job, student } => {
            let job = town.jobs.assign(&job, &student, &mut town.students)?;
            println!("✓ Assigned to {} ({} open)", job.title, job.open_positions());
        }
        JobCmd::Unassign { student } => {
            town.jobs.unassign(&student, &mut town.students)?;
            println!("✓ Student released from their job");
        }
    }
    Ok(())
}

fn savings(town: &mut Town, cmd: SavingsCmd) -> Result<()> {
    match cmd {
        SavingsCmd::Product { classroom, name, kind, rate, term, min_amount } => {
            town.classrooms.require(&classroom)?;
            let p = town
                .bank
                .create_product(&classroom, &name, kind.into(), rate, term, min_amount)?;
            println!("✓ Created {} product {} ({})", p.kind.as_str(), p.name, p.id);
        }
        SavingsCmd::Products { classroom } => {
            for p in town.bank.products(&classroom) {
                println!(
                    "{}  {:<20} {:<8} {:>5.2}%  {:>3} months  min {:.2}{}",
                    p.id,
                    p.name,
                    p.kind.as_str(),
                    p.base_rate,
                    p.term_months,
                    p.min_amount,
                    if p.active { "" } else { "  (inactive)" }
                );
            }
        }
        SavingsCmd::Open { student, product, amount, date } => {
            let product = town.bank.require_product(&product)?.clone();
            let account = town.savings.open(
                &student,
                &product,
                amount,
                date.unwrap_or_else(today),
                &town.config,
                &mut town.students,
                &mut town.ledger,
            )?;
            println!(
                "✓ Opened {} at {:.2}% until {} ({})",
                product.name, account.interest_rate, account.maturity_date, account.id
            );
        }
        SavingsCmd::Contribute { account, amount } => {
            let account =
                town.savings
                    .contribute(&account, amount, &mut town.students, &mut town.ledger)?;
            println!("✓ Principal is now {:.2}", account.principal);
        }
        SavingsCmd::Quote { account, date } => {
            let q = town.savings.quote(&account, date.unwrap_or_else(today))?;
            println!("  Principal:   {:>10.2}", q.principal);
            println!("  Rate:        {:>9.2}%", q.annual_rate);
            println!("  Elapsed:     {:>4}/{} months", q.elapsed_months, q.term_months);
            println!("  Accrued:     {:>10.2}", q.accrued_interest);
            println!("  Balance:     {:>10.2}", q.current_balance);
            println!("  At maturity: {:>10.2}", q.maturity_amount);
        }
        SavingsCmd::Withdraw { account, date } => {
            let settlement = town.savings.withdraw(
                &account,
                date.unwrap_or_else(today),
                town.config.early_withdrawal_penalty,
                &mut town.students,
                &mut town.ledger,
            )?;
            if settlement.early {
                println!(
                    "✓ Paid out {:.2} early (interest {:.2}, penalty {:.2})",
                    settlement.payout, settlement.interest_paid, settlement.penalty
                );
            } else {
                println!("✓ Paid out {:.2} at maturity", settlement.payout);
            }
        }
        SavingsCmd::List { student } => {
            let as_of = today();
            for a in town.savings.list_for_student(&student) {
                println!(
                    "{}  {:<8} {:?}  principal {:>10.2}  now {:>10.2}  matures {}",
                    a.id,
                    a.kind.as_str(),
                    a.status,
                    a.principal,
                    a.current_balance(as_of),
                    a.maturity_date
                );
            }
        }
    }
    Ok(())
}

fn stock(town: &mut Town, cmd: StockCmd) -> Result<()> {
    let fee_rate = town.config.trading_fee_rate;
    match cmd {
        StockCmd::List { classroom } => {
            for s in town.stocks.list(&classroom) {
                println!(
                    "{}  {:<6} {:<20} {:>8.2} ({:+.1}%)",
                    s.id,
                    s.symbol,
                    s.name,
                    s.price,
                    s.change_percent()
                );
            }
        }
        StockCmd::Add { classroom, symbol, name, price, volatility } => {
            town.classrooms.require(&classroom)?;
            let mut s = town.stocks.add_stock(&classroom, &symbol, &name, price)?;
            if let Some(volatility) = volatility {
                s = town.stocks.set_volatility(&s.id, volatility)?;
            }
            println!(
                "✓ Listed {} at {:.2}, volatility {:.0}% ({})",
                s.symbol,
                s.price,
                s.volatility * 100.0,
                s.id
            );
        }
        StockCmd::Delist { stock } => {
            let s = town.stocks.delist(&stock)?;
            println!("✓ Delisted {} ({})", s.symbol, s.id);
        }
        StockCmd::Buy { student, stock, quantity } => {
            let receipt =
                town.stocks
                    .buy(&student, &stock, quantity, fee_rate, &mut town.students, &mut town.ledger)?;
            println!(
                "✓ Bought {} @ {:.2}, paid {:.2} (fee {:.2}); cash left {:.2}",
                receipt.transaction.quantity,
                receipt.transaction.price,
                receipt.transaction.total,
                receipt.transaction.fee,
                receipt.balance_after
            );
        }
        StockCmd::Sell { student, stock, quantity } => {
            let receipt =
                town.stocks
                    .sell(&student, &stock, quantity, fee_rate, &mut town.students, &mut town.ledger)?;
            println!(
                "✓ Sold {} @ {:.2}, received {:.2} (profit {:.2}); cash now {:.2}",
                receipt.transaction.quantity,
                receipt.transaction.price,
                receipt.transaction.total,
                receipt.transaction.realized_profit.unwrap_or(0.0),
                receipt.balance_after
            );
        }
        StockCmd::Portfolio { student } => {
            let holdings = town.stocks.holdings(&student);
            for h in &holdings {
                println!(
                    "  {:<6} {:>5} × {:>8.2} (avg {:>8.2})  value {:>10.2}  P/L {:+.2}",
                    h.symbol, h.quantity, h.price, h.average_cost, h.market_value, h.unrealized_profit
                );
            }
            let total: f64 = holdings.iter().map(|h| h.market_value).sum();
            println!("  Total value {:.2}", total);
        }
    }
    Ok(())
}

fn market(town: &mut Town, cmd: MarketCmd) -> Result<()> {
    let min_price = town.config.min_stock_price;
    match cmd {
        MarketCmd::Tick { classroom } => {
            let mut rng = rand::thread_rng();
            let changes = town.market.tick(&classroom, &mut town.stocks, &mut rng, min_price)?;
            println!("📈 {} prices moved", changes.len());
            print_changes(&changes);
        }
        MarketCmd::News { classroom, headline, impact, stock, body } => {
            let news = MarketNews::new(&classroom, &headline, &body, stock.as_deref(), impact)?;
            let changes = town.market.publish(news, &mut town.stocks, min_price)?;
            println!("📰 {}", headline);
            print_changes(&changes);
        }
        MarketCmd::Feed { classroom } => {
            for n in town.market.feed(&classroom) {
                println!(
                    "{}  {:+.1}%  {}",
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.impact_percent,
                    n.headline
                );
            }
        }
    }
    Ok(())
}

fn achievement(town: &mut Town, cmd: AchievementCmd) -> Result<()> {
    match cmd {
        AchievementCmd::Create { classroom, name, reward, credit_bonus, description } => {
            town.classrooms.require(&classroom)?;
            let a = town
                .achievements
                .create(&classroom, &name, &description, reward, credit_bonus)?;
            println!("✓ Created achievement {} ({})", a.name, a.id);
        }
        AchievementCmd::List { classroom } => {
            for a in town.achievements.list(&classroom) {
                println!(
                    "{}  {:<24} reward {:>8.2}  credit +{}",
                    a.id, a.name, a.reward, a.credit_bonus
                );
            }
        }
        AchievementCmd::Award { achievement, student } => {
            town.achievements
                .award(&achievement, &student, &mut town.students, &mut town.ledger)?;
            let s = town.students.require(&student)?;
            println!("🏆 Awarded; {} now has {:.2} and credit {}", s.name, s.balance, s.credit_score);
        }
    }
    Ok(())
}
