// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashcast::db;
use cashcast::errors::ForecastError;
use cashcast::models::{
    AmountType, Cycle, DistributionType, Salary, SalaryCost, Transaction, TransactionKind,
    VatSetting,
};
use cashcast::store;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
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

fn salary(conn: &Connection) -> i64 {
    let employee = store::insert_employee(conn, USER, "Grace").unwrap();
    store::insert_salary(
        conn,
        USER,
        &Salary {
            id: 0,
            employee_id: employee,
            amount: 800_000,
            currency: "CHF".into(),
            cycle: Cycle::Monthly,
            from_date: d(2024, 1, 1),
            to_date: Some(d(2024, 12, 31)),
            is_termination: false,
            is_disabled: false,
        },
    )
    .unwrap()
}

fn cost(salary_id: i64, amount_type: AmountType, amount: u64, base: Vec<i64>) -> SalaryCost {
    SalaryCost {
        id: 0,
        salary_id,
        label: None,
        cycle: Cycle::Quarterly,
        amount_type,
        amount,
        distribution_type: DistributionType::Employer,
        relative_offset: NonZeroU32::new(2).unwrap(),
        target_date: Some(d(2024, 3, 31)),
        base_cost_ids: base,
    }
}

#[test]
fn schema_bootstrap_is_idempotent_and_seeds_a_user() {
    let mut conn = setup();
    db::init_schema(&mut conn).unwrap();
    assert_eq!(store::organisation_base_currency(&conn, USER).unwrap(), "CHF");
    assert!(matches!(
        store::organisation_base_currency(&conn, 42),
        Err(ForecastError::UnknownUser(42))
    ));
    store::set_base_currency(&conn, USER, "EUR").unwrap();
    assert_eq!(store::organisation_base_currency(&conn, USER).unwrap(), "EUR");
}

#[test]
fn horizon_setting_is_validated() {
    let conn = setup();
    assert_eq!(store::max_forecast_years(&conn).unwrap(), 3);
    store::set_max_forecast_years(&conn, 5).unwrap();
    assert_eq!(store::max_forecast_years(&conn).unwrap(), 5);
    assert!(matches!(
        store::set_max_forecast_years(&conn, 0),
        Err(ForecastError::InvalidHorizon(0))
    ));
    assert!(store::set_max_forecast_years(&conn, 11).is_err());
}

#[test]
fn transactions_round_trip_through_sqlite() {
    let conn = setup();
    let tx = Transaction {
        id: 0,
        name: "Hosting".into(),
        amount: -12_990,
        currency: "EUR".into(),
        kind: TransactionKind::Repeating,
        cycle: Some(Cycle::Yearly),
        start_date: d(2024, 2, 29),
        end_date: Some(d(2026, 2, 28)),
        category: "IT".into(),
        vat_rate: Some(8_100),
        vat_included: true,
        is_disabled: false,
    };
    let id = store::insert_transaction(&conn, USER, &tx).unwrap();
    let stored = store::list_transactions(&conn, USER).unwrap();
    assert_eq!(stored, vec![Transaction { id, ..tx }]);
    assert_eq!(store::list_categories(&conn, USER).unwrap()[0].name, "IT");

    store::set_transaction_disabled(&conn, USER, id, true).unwrap();
    assert!(store::list_transactions(&conn, USER).unwrap()[0].is_disabled);
    assert!(matches!(
        store::set_transaction_disabled(&conn, USER, id + 100, true),
        Err(ForecastError::TransactionNotFound(_))
    ));
}

#[test]
fn schema_constraints_reject_bad_rows() {
    let conn = setup();
    conn.execute(
        "INSERT INTO transactions(organisation_id, name, amount, currency, type, start_date, category_id)
         VALUES (1, 'x', 1, 'CHF', 'single', '2024-01-01',
                 (SELECT id FROM categories WHERE name='none'))",
        [],
    )
    .unwrap_err();

    let category = store::ensure_category(&conn, USER, "Misc").unwrap();
    conn.execute(
        "INSERT INTO transactions(organisation_id, name, amount, currency, type, start_date, category_id)
         VALUES (1, 'x', 1, 'CHF', 'monthly', '2024-01-01', ?1)",
        params![category],
    )
    .unwrap_err();
}

#[test]
fn cost_base_links_are_loaded_with_the_cost() {
    let conn = setup();
    let salary_id = salary(&conn);
    let base = store::insert_salary_cost(&conn, USER, &cost(salary_id, AmountType::Fixed, 40_000, vec![])).unwrap();
    let pct = store::insert_salary_cost(
        &conn,
        USER,
        &cost(salary_id, AmountType::Percentage, 5_000, vec![base]),
    )
    .unwrap();

    let loaded = store::get_salary_cost(&conn, USER, pct).unwrap();
    assert_eq!(loaded.base_cost_ids, vec![base]);
    assert_eq!(loaded.relative_offset.get(), 2);
    assert_eq!(loaded.target_date, Some(d(2024, 3, 31)));
    assert_eq!(store::list_salary_costs(&conn, USER, salary_id).unwrap().len(), 2);
    assert_eq!(store::list_user_salary_costs(&conn, USER).unwrap().len(), 2);
    assert!(matches!(
        store::get_salary_cost(&conn, USER, 999),
        Err(ForecastError::SalaryCostNotFound(999))
    ));
}

#[test]
fn base_cost_of_another_salary_is_refused() {
    let conn = setup();
    let first = salary(&conn);
    let second = salary(&conn);
    let base = store::insert_salary_cost(&conn, USER, &cost(first, AmountType::Fixed, 1_000, vec![])).unwrap();
    let err = store::insert_salary_cost(
        &conn,
        USER,
        &cost(second, AmountType::Percentage, 5_000, vec![base]),
    )
    .unwrap_err();
    assert!(matches!(err, ForecastError::ForeignBaseCost { .. }));
}

#[test]
fn exclusions_toggle_per_month() {
    let conn = setup();
    store::set_forecast_exclusion(&conn, USER, "2024-05", 7, "salaries", true).unwrap();
    store::set_forecast_exclusion(&conn, USER, "2024-06", 7, "salaries", true).unwrap();
    store::set_forecast_exclusion(&conn, USER, "2024-05", 7, "salaries", true).unwrap();
    let months = store::list_forecast_exclusions(&conn, USER, 7, "salaries").unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months.get("2024-05"), Some(&true));

    store::set_forecast_exclusion(&conn, USER, "2024-05", 7, "salaries", false).unwrap();
    let months = store::list_forecast_exclusions(&conn, USER, 7, "salaries").unwrap();
    assert_eq!(months.keys().collect::<Vec<_>>(), vec!["2024-06"]);
    assert!(store::list_forecast_exclusions(&conn, USER, 7, "transactions").unwrap().is_empty());
}

#[test]
fn fiat_rates_and_vat_settings_upsert() {
    let conn = setup();
    store::upsert_fiat_rate(&conn, "CHF", "EUR", Decimal::new(105, 2)).unwrap();
    store::upsert_fiat_rate(&conn, "CHF", "EUR", Decimal::new(104, 2)).unwrap();
    let rates = store::list_fiat_rates(&conn, "CHF").unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].rate, Decimal::new(104, 2));

    assert_eq!(store::vat_setting(&conn, USER).unwrap(), None);
    let setting = VatSetting {
        enabled: true,
        billing_date: d(2024, 6, 30),
        transaction_month_offset: 2,
        interval: Cycle::Biannually,
    };
    store::set_vat_setting(&conn, USER, &setting).unwrap();
    store::set_vat_setting(&conn, USER, &setting).unwrap();
    assert_eq!(store::vat_setting(&conn, USER).unwrap(), Some(setting));
}
