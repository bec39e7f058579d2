// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashcast::db;
use cashcast::errors::ForecastError;
use cashcast::forecast::aggregate::calculate_forecast;
use cashcast::forecast::refresh;
use cashcast::forecast::ForecastOptions;
use cashcast::models::{
    AmountType, Cycle, DistributionType, MonthlyForecast, Salary, SalaryCost, Transaction,
    TransactionKind, VatSetting,
};
use cashcast::store;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::num::NonZeroU32;

const USER: i64 = db::DEFAULT_USER_ID;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn opts() -> ForecastOptions {
    ForecastOptions::new(d(2024, 1, 1), 3)
}

fn single(name: &str, amount: i64, start: NaiveDate) -> Transaction {
    Transaction {
        id: 0,
        name: name.into(),
        amount,
        currency: "CHF".into(),
        kind: TransactionKind::Single,
        cycle: None,
        start_date: start,
        end_date: None,
        category: "Sales".into(),
        vat_rate: None,
        vat_included: false,
        is_disabled: false,
    }
}

fn add_salary(conn: &Connection, amount: u64) -> i64 {
    let employee = store::insert_employee(conn, USER, "Ada").unwrap();
    store::insert_salary(
        conn,
        USER,
        &Salary {
            id: 0,
            employee_id: employee,
            amount,
            currency: "CHF".into(),
            cycle: Cycle::Monthly,
            from_date: d(2024, 1, 1),
            to_date: None,
            is_termination: false,
            is_disabled: false,
        },
    )
    .unwrap()
}

fn fixed_cost(salary_id: i64, amount: u64, distribution: DistributionType, offset: u32) -> SalaryCost {
    SalaryCost {
        id: 0,
        salary_id,
        label: Some("Pension".into()),
        cycle: Cycle::Monthly,
        amount_type: AmountType::Fixed,
        amount,
        distribution_type: distribution,
        relative_offset: NonZeroU32::new(offset).unwrap(),
        target_date: None,
        base_cost_ids: Vec::new(),
    }
}

fn month<'a>(rows: &'a [MonthlyForecast], key: &str) -> &'a MonthlyForecast {
    rows.iter().find(|f| f.month == key).unwrap()
}

#[test]
fn vat_included_single_transaction_yields_one_month() {
    let mut conn = setup();
    let mut tx = single("Deal", 10_000, d(2024, 2, 1));
    tx.vat_rate = Some(8_100);
    tx.vat_included = true;
    store::insert_transaction(&conn, USER, &tx).unwrap();

    let rows = calculate_forecast(&mut conn, USER, &opts()).unwrap();
    assert_eq!(
        rows,
        vec![MonthlyForecast {
            month: "2024-02".into(),
            revenue: 10_000,
            expense: 0,
            cashflow: 10_000,
        }]
    );
    assert_eq!(store::list_forecasts(&conn, USER, 100).unwrap(), rows);
}

#[test]
fn rebuilding_twice_gives_identical_results() {
    let mut conn = setup();
    store::insert_transaction(&conn, USER, &single("Deal", 25_000, d(2024, 3, 15))).unwrap();
    let mut rent = single("Rent", -4_000, d(2023, 11, 30));
    rent.kind = TransactionKind::Repeating;
    rent.cycle = Some(Cycle::Monthly);
    rent.category = "Office".into();
    store::insert_transaction(&conn, USER, &rent).unwrap();
    add_salary(&conn, 700_000);

    let first = refresh::rebuild_all(&mut conn, USER, &opts()).unwrap();
    let first_details = store::list_forecast_details(&conn, USER, usize::MAX).unwrap();
    let second = refresh::rebuild_all(&mut conn, USER, &opts()).unwrap();
    let second_details = store::list_forecast_details(&conn, USER, usize::MAX).unwrap();
    assert_eq!(first, second);
    assert_eq!(first_details, second_details);
    assert_eq!(month(&first, "2024-03").cashflow, 25_000 - 4_000 - 700_000);
}

#[test]
fn excluded_month_is_zero_but_listed() {
    let mut conn = setup();
    let id = store::insert_transaction(&conn, USER, &single("Deal", 10_000, d(2024, 2, 1))).unwrap();
    store::set_forecast_exclusion(&conn, USER, "2024-02", id, "transactions", true).unwrap();

    let rows = calculate_forecast(&mut conn, USER, &opts()).unwrap();
    assert_eq!(month(&rows, "2024-02").revenue, 0);

    let details = store::list_forecast_details(&conn, USER, usize::MAX).unwrap();
    let sales = &details[0].revenue[0];
    assert_eq!(sales.name, "Sales");
    let leaf = &sales.children[0];
    assert_eq!(leaf.name, "Deal");
    assert_eq!(leaf.related_id, Some(id));
    assert_eq!(leaf.related_table.as_deref(), Some("transactions"));
    assert!(leaf.is_excluded);

    store::set_forecast_exclusion(&conn, USER, "2024-02", id, "transactions", false).unwrap();
    let rows = calculate_forecast(&mut conn, USER, &opts()).unwrap();
    assert_eq!(month(&rows, "2024-02").revenue, 10_000);
}

#[test]
fn disabled_transaction_and_employee_contribute_nothing() {
    let mut conn = setup();
    let mut tx = single("Deal", 10_000, d(2024, 2, 1));
    tx.kind = TransactionKind::Repeating;
    tx.cycle = Some(Cycle::Quarterly);
    let tx_id = store::insert_transaction(&conn, USER, &tx).unwrap();
    store::set_transaction_disabled(&conn, USER, tx_id, true).unwrap();

    let salary = add_salary(&conn, 500_000);
    let employee = store::get_salary(&conn, USER, salary).unwrap().employee_id;
    store::set_employee_disabled(&conn, USER, employee, true).unwrap();

    let rows = refresh::rebuild_all(&mut conn, USER, &opts()).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn both_distribution_doubles_the_cost() {
    let mut conn = setup();
    let salary = add_salary(&conn, 1_000_000);
    let cost = store::insert_salary_cost(
        &conn,
        USER,
        &fixed_cost(salary, 51_000, DistributionType::Both, 1),
    )
    .unwrap();
    let rows = refresh::after_cost_change(&mut conn, USER, cost, &opts()).unwrap();

    assert_eq!(month(&rows, "2024-01").expense, -1_000_000);
    assert_eq!(month(&rows, "2024-03").expense, -1_102_000);
    assert_eq!(month(&rows, "2025-06").expense, -1_102_000);
}

#[test]
fn employee_deductions_reduce_the_net_salary() {
    let mut conn = setup();
    let salary = add_salary(&conn, 1_000_000);
    store::insert_salary_cost(
        &conn,
        USER,
        &fixed_cost(salary, 50_000, DistributionType::Employee, 1),
    )
    .unwrap();
    let rows = refresh::after_salary_change(&mut conn, USER, salary, &opts()).unwrap();
    // Net payout drops by the deduction, which is then paid out separately.
    assert_eq!(month(&rows, "2024-01").expense, -950_000);
    assert_eq!(month(&rows, "2024-04").expense, -1_000_000);
}

#[test]
fn quarterly_cost_walks_to_the_step_after_the_salary_ends() {
    let mut conn = setup();
    let employee = store::insert_employee(&conn, USER, "Lin").unwrap();
    let salary = store::insert_salary(
        &conn,
        USER,
        &Salary {
            id: 0,
            employee_id: employee,
            amount: 100_000,
            currency: "CHF".into(),
            cycle: Cycle::Monthly,
            from_date: d(2024, 1, 1),
            to_date: Some(d(2024, 12, 31)),
            is_termination: false,
            is_disabled: false,
        },
    )
    .unwrap();
    let mut quarterly = fixed_cost(salary, 30_000, DistributionType::Employer, 1);
    quarterly.cycle = Cycle::Quarterly;
    let cost = store::insert_salary_cost(&conn, USER, &quarterly).unwrap();

    let rows = refresh::rebuild_all(&mut conn, USER, &opts()).unwrap();
    let posted: Vec<_> = store::list_salary_cost_details(&conn, cost)
        .unwrap()
        .into_iter()
        .map(|r| r.month)
        .collect();
    assert_eq!(posted, ["2024-05", "2024-08", "2024-11", "2025-02"]);

    for key in ["2024-05", "2024-08", "2024-11"] {
        assert_eq!(month(&rows, key).expense, -130_000);
    }
    assert_eq!(month(&rows, "2024-04").expense, -100_000);
    assert_eq!(month(&rows, "2025-02").expense, -30_000);
    assert!(rows.iter().all(|r| r.month.as_str() <= "2025-02"));
}

#[test]
fn termination_salary_contributes_nothing() {
    let mut conn = setup();
    let employee = store::insert_employee(&conn, USER, "Sam").unwrap();
    let salary = store::insert_salary(
        &conn,
        USER,
        &Salary {
            id: 0,
            employee_id: employee,
            amount: 400_000,
            currency: "CHF".into(),
            cycle: Cycle::Monthly,
            from_date: d(2024, 1, 1),
            to_date: Some(d(2024, 6, 30)),
            is_termination: true,
            is_disabled: false,
        },
    )
    .unwrap();
    assert!(store::get_salary(&conn, USER, salary).unwrap().is_termination);

    let rows = refresh::rebuild_all(&mut conn, USER, &opts()).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn offset_cost_posts_three_months_at_once() {
    let mut conn = setup();
    let salary = add_salary(&conn, 600_000);
    let cost = store::insert_salary_cost(
        &conn,
        USER,
        &fixed_cost(salary, 10_000, DistributionType::Employer, 3),
    )
    .unwrap();
    refresh::after_cost_change(&mut conn, USER, cost, &opts()).unwrap();

    let details = store::list_salary_cost_details(&conn, cost).unwrap();
    assert_eq!(details[0].month, "2024-05");
    assert_eq!(details[0].amount, 30_000);
    assert_eq!(details[0].divider, 3);
    assert!(details.iter().all(|r| r.divider == 3));
    assert!(details.windows(2).all(|w| w[0].month < w[1].month));
}

#[test]
fn no_month_beyond_the_horizon() {
    let mut conn = setup();
    let mut rent = single("Rent", -4_000, d(2022, 1, 1));
    rent.kind = TransactionKind::Repeating;
    rent.cycle = Some(Cycle::Monthly);
    store::insert_transaction(&conn, USER, &rent).unwrap();
    add_salary(&conn, 100_000);
    store::set_max_forecast_years(&conn, 2).unwrap();

    let opts = ForecastOptions::load(&conn, d(2024, 1, 1)).unwrap();
    let rows = refresh::rebuild_all(&mut conn, USER, &opts).unwrap();
    assert_eq!(rows.len(), 25);
    assert_eq!(rows.first().unwrap().month, "2024-01");
    assert_eq!(rows.last().unwrap().month, "2026-01");
}

#[test]
fn conversion_rounds_half_away_from_zero() {
    let mut conn = setup();
    store::upsert_fiat_rate(&conn, "CHF", "EUR", Decimal::new(2, 0)).unwrap();
    let mut income = single("Fee", 5, d(2024, 2, 1));
    income.currency = "EUR".into();
    let mut cost = single("Refund", -5, d(2024, 3, 1));
    cost.currency = "EUR".into();
    store::insert_transaction(&conn, USER, &income).unwrap();
    store::insert_transaction(&conn, USER, &cost).unwrap();

    let rows = calculate_forecast(&mut conn, USER, &opts()).unwrap();
    assert_eq!(month(&rows, "2024-02").revenue, 3);
    assert_eq!(month(&rows, "2024-03").expense, -3);
}

#[test]
fn failed_run_keeps_the_previous_forecast() {
    let mut conn = setup();
    store::insert_transaction(&conn, USER, &single("Deal", 10_000, d(2024, 2, 1))).unwrap();
    let before = calculate_forecast(&mut conn, USER, &opts()).unwrap();

    let mut foreign = single("Import", -1_000, d(2024, 4, 1));
    foreign.currency = "USD".into();
    store::insert_transaction(&conn, USER, &foreign).unwrap();
    let err = calculate_forecast(&mut conn, USER, &opts()).unwrap_err();
    assert!(matches!(err, ForecastError::MissingFiatRate { .. }));

    assert_eq!(store::list_forecasts(&conn, USER, 100).unwrap(), before);
}

#[test]
fn vat_settlement_posts_after_the_billing_month() {
    let mut conn = setup();
    let mut tx = single("Deal", 100_000, d(2024, 2, 15));
    tx.vat_rate = Some(8_100);
    store::insert_transaction(&conn, USER, &tx).unwrap();
    store::set_vat_setting(
        &conn,
        USER,
        &VatSetting {
            enabled: true,
            billing_date: d(2024, 3, 31),
            transaction_month_offset: 1,
            interval: Cycle::Quarterly,
        },
    )
    .unwrap();

    let rows = calculate_forecast(&mut conn, USER, &opts()).unwrap();
    assert_eq!(month(&rows, "2024-02").revenue, 108_100);
    assert_eq!(month(&rows, "2024-04").expense, -8_100);

    let details = store::list_forecast_details(&conn, USER, usize::MAX).unwrap();
    let april = details.iter().find(|r| r.month == "2024-04").unwrap();
    assert_eq!(april.expense[0].name, "VAT");
    assert_eq!(april.expense[0].children[0].related_table.as_deref(), Some("vat_settlement"));
}

#[test]
fn unknown_user_is_a_lookup_failure() {
    let mut conn = setup();
    assert!(matches!(
        calculate_forecast(&mut conn, 99, &opts()),
        Err(ForecastError::UnknownUser(99))
    ));
}
