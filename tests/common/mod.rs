#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;

/// Cell value written into a fixture sheet.
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Blank,
}

pub const SURVEY_HEADERS: [&str; 14] = [
    "Timestamp",
    "Orari",
    "Stacioni",
    "Linja",
    "Bileta",
    "Linjat e perdorura",
    "Qellimi",
    "Qellimi kryesor",
    "Udhetime",
    "Dite",
    "Gjinia",
    "Mosha",
    "Cmimi",
    "Ticket",
];

pub const OPERATION_HEADERS: [&str; 3] = ["Linja", "Km", "Mjete"];

/// One survey response in sheet column order.
pub fn survey_row(
    route: Cell,
    slot: &'static str,
    age: &'static str,
    price: Cell,
    trips: Cell,
) -> Vec<Cell> {
    vec![
        Cell::Text("2024-03-01 07:15:00"),
        Cell::Text(slot),
        Cell::Text("Sheshi Skenderbej"),
        route,
        Cell::Text("single"),
        Cell::Text("22"),
        Cell::Text("work"),
        Cell::Text("work"),
        trips,
        Cell::Number(5.0),
        Cell::Text("F"),
        Cell::Text(age),
        price,
        Cell::Text("single"),
    ]
}

pub fn operation_row(route: f64, kilometers: f64, vehicles: f64) -> Vec<Cell> {
    vec![
        Cell::Number(route),
        Cell::Number(kilometers),
        Cell::Number(vehicles),
    ]
}

/// Survey rows shared by the pipeline and API tests.
///
/// Route 22 carries the two-row reference example plus an unparseable
/// price, route 7 has zero kilometers, route 99 has no operational row and
/// the last row has no route at all.
pub fn reference_survey() -> Vec<Vec<Cell>> {
    vec![
        survey_row(
            Cell::Number(22.0),
            "07:00-10:00",
            "19-60",
            Cell::Number(1.5),
            Cell::Number(2.0),
        ),
        survey_row(
            Cell::Number(22.0),
            "07:00-10:00",
            "19-60",
            Cell::Number(2.0),
            Cell::Number(1.0),
        ),
        survey_row(
            Cell::Number(22.0),
            "07:00-10:00",
            "19-60",
            Cell::Text("N/A"),
            Cell::Number(1.0),
        ),
        survey_row(
            Cell::Text("7"),
            "10:00-13:00",
            "0-18",
            Cell::Number(0.4),
            Cell::Text("10"),
        ),
        survey_row(
            Cell::Number(99.0),
            "16:00-19:00",
            "60+",
            Cell::Number(1.0),
            Cell::Number(5.0),
        ),
        survey_row(
            Cell::Blank,
            "16:00-19:00",
            "60+",
            Cell::Number(1.0),
            Cell::Number(5.0),
        ),
    ]
}

pub fn reference_operations() -> Vec<Vec<Cell>> {
    vec![
        operation_row(22.0, 100.0, 4.0),
        operation_row(7.0, 0.0, 2.0),
        operation_row(22.0, 1.0, 1.0),
    ]
}

/// A sheet to place in a fixture workbook.
pub struct Sheet<'a> {
    pub name: &'a str,
    pub headers: &'a [&'a str],
    pub rows: Vec<Vec<Cell>>,
}

pub fn write_workbook(path: &Path, sheets: Vec<Sheet<'_>>) {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).expect("sheet named");
        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *header)
                .expect("header written");
        }
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let row_num = (row_idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(value) => {
                        worksheet
                            .write_string(row_num, col as u16, *value)
                            .expect("text written");
                    }
                    Cell::Number(value) => {
                        worksheet
                            .write_number(row_num, col as u16, *value)
                            .expect("number written");
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save(path).expect("workbook saved");
}

/// Writes the reference survey and operation sheets to `dir/data.xlsx`.
pub fn reference_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("data.xlsx");
    write_workbook(
        &path,
        vec![
            Sheet {
                name: "survey",
                headers: &SURVEY_HEADERS,
                rows: reference_survey(),
            },
            Sheet {
                name: "operation",
                headers: &OPERATION_HEADERS,
                rows: reference_operations(),
            },
        ],
    );
    path
}

pub fn approx(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() < 1e-9
}
