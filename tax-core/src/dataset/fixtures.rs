//! A compact 2024 dataset shared by the unit tests.

use serde_json::json;

use super::{RawDataset, TaxYearDataset};

pub(crate) const YEAR: i32 = 2024;

pub(crate) fn raw_json() -> serde_json::Value {
    json!({
        "federal": {
            "year": 2024,
            "brackets": [
                { "threshold": 0, "rate": 0.15 },
                { "threshold": 55867, "rate": 0.205 },
                { "threshold": 111733, "rate": 0.26 },
                { "threshold": 173205, "rate": 0.29 },
                { "threshold": 246752, "rate": 0.33 }
            ],
            "credits": {
                "basicPersonalAmount": {
                    "amount": 15705,
                    "phaseOut": { "start": 173205, "end": 246752, "minimumAmount": 14156 }
                },
                "employmentAmount": { "amount": 1433 },
                "cppEi": {}
            }
        },
        "provinces": {
            "provinces": {
                "ON": {
                    "brackets": [
                        { "threshold": 0, "rate": 0.0505 },
                        { "threshold": 51446, "rate": 0.0915 },
                        { "threshold": 102894, "rate": 0.1116 },
                        { "threshold": 150000, "rate": 0.1216 },
                        { "threshold": 220000, "rate": 0.1316 }
                    ],
                    "credits": { "basicPersonalAmount": { "amount": 12399 } },
                    "surtaxes": [
                        { "threshold": 5554, "rate": 0.20, "threshold2": 7108, "rate2": 0.36 }
                    ],
                    "premiums": [
                        { "name": "Ontario Health Premium", "formula": "ontario_health_premium" }
                    ]
                },
                "British Columbia": {
                    "brackets": [
                        { "threshold": 0, "rate": 0.0506 },
                        { "threshold": 47937, "rate": 0.077 },
                        { "threshold": 95875, "rate": 0.105 },
                        { "threshold": 110076, "rate": 0.1229 },
                        { "threshold": 133664, "rate": 0.147 },
                        { "threshold": 181232, "rate": 0.168 },
                        { "threshold": 252752, "rate": 0.205 }
                    ],
                    "credits": { "basicPersonalAmount": { "amount": 12580 } }
                },
                "alberta": {
                    "brackets": [
                        { "threshold": 0, "rate": 0.10 },
                        { "threshold": 148269, "rate": 0.12 },
                        { "threshold": 177922, "rate": 0.13 },
                        { "threshold": 237230, "rate": 0.14 },
                        { "threshold": 355845, "rate": 0.15 }
                    ],
                    "credits": { "basicPersonalAmount": { "amount": 21885 } }
                },
                "Québec": {
                    "brackets": [
                        { "threshold": 0, "rate": 0.14 },
                        { "threshold": 51780, "rate": 0.19 },
                        { "threshold": 103545, "rate": 0.24 },
                        { "threshold": 126000, "rate": 0.2575 }
                    ],
                    "credits": { "basicPersonalAmount": { "amount": 18056, "rate": 0.14 } }
                },
                "Manitoba": {
                    "brackets": [
                        { "threshold": 0, "rate": 0.108 },
                        { "threshold": 47000, "rate": 0.1275 },
                        { "threshold": 100000, "rate": 0.174 }
                    ],
                    "credits": { "basicPersonalAmount": { "amount": 15780 } }
                }
            }
        },
        "payroll": {
            "cpp": {
                "rate": 0.0595,
                "basicExemption": 3500,
                "maxPensionableEarnings": 68500,
                "maxContribution": 3867.50
            },
            "cpp2": {
                "rate": 0.04,
                "maxAdditionalEarnings": 4700,
                "maxAdditionalContribution": 188
            },
            "ei": {
                "rate": 0.0166,
                "maxInsurableEarnings": 63200,
                "maxPremium": 1049.12
            }
        },
        "dividends": {
            "eligible": {
                "grossUpRate": 1.38,
                "credits": {
                    "federal": { "base": "grossed_up", "rate": 0.150198 },
                    "provincial": {
                        "base": "grossed_up",
                        "rate": { "ON": 0.10, "BC": 0.12, "AB": 0.0812, "QC": 0.117, "MB": 0.08 }
                    }
                }
            },
            "nonEligible": {
                "grossUpRate": 1.15,
                "credits": {
                    "federal": { "base": "grossed_up", "rate": 0.090301 },
                    "provincial": {
                        "base": "grossed_up",
                        "rate": { "ON": 0.029863, "BC": 0.0196, "AB": 0.0218, "QC": 0.0342, "MB": 0.007835 }
                    }
                }
            }
        }
    })
}

pub(crate) fn raw() -> RawDataset {
    serde_json::from_value(raw_json()).expect("fixture JSON matches the raw schema")
}

pub(crate) fn dataset() -> TaxYearDataset {
    TaxYearDataset::from_raw(YEAR, raw()).expect("fixture dataset is valid")
}
