//! Default reference data seeded into a new branch (Philippine cooperative).

pub(super) const COUNTRY_CODE: &str = "PH";

/// `(name, description)`
pub(super) const BANKS: &[(&str, &str)] = &[
    ("BDO Unibank", "Banco de Oro, the largest universal bank by assets"),
    ("Bank of the Philippine Islands", "BPI universal bank"),
    ("Land Bank of the Philippines", "Government-owned bank serving farmers and fishers"),
    ("Metropolitan Bank and Trust Company", "Metrobank universal bank"),
    ("Philippine National Bank", "PNB universal bank"),
    ("Security Bank Corporation", "Security Bank universal bank"),
    ("China Banking Corporation", "Chinabank universal bank"),
    ("Development Bank of the Philippines", "Government-owned development bank"),
];

/// `(name, value)`
pub(super) const BILLS_AND_COINS: &[(&str, f64)] = &[
    ("₱ 1000 Bill", 1000.00),
    ("₱ 500 Bill", 500.00),
    ("₱ 200 Bill", 200.00),
    ("₱ 100 Bill", 100.00),
    ("₱ 50 Bill", 50.00),
    ("₱ 20 Bill", 20.00),
    ("₱ 20 Coin", 20.00),
    ("₱ 10 Coin", 10.00),
    ("₱ 5 Coin", 5.00),
    ("₱ 1 Coin", 1.00),
    ("₱ 0.25 Sentimo Coin", 0.25),
    ("₱ 0.05 Sentimo Coin", 0.05),
    ("₱ 0.01 Sentimo Coin", 0.01),
];

/// Regular holidays with fixed dates: `(month, day, name, description)`.
pub(super) const HOLIDAYS: &[(u32, u32, &str, &str)] = &[
    (1, 1, "New Year's Day", "First day of the calendar year"),
    (4, 9, "Araw ng Kagitingan", "Day of Valor"),
    (5, 1, "Labor Day", "International Workers' Day"),
    (6, 12, "Independence Day", "Proclamation of Philippine independence, 1898"),
    (8, 21, "Ninoy Aquino Day", "Anniversary of the death of Benigno Aquino Jr."),
    (11, 1, "All Saints' Day", "Day of remembrance of the departed"),
    (11, 30, "Bonifacio Day", "Birth anniversary of Andres Bonifacio"),
    (12, 8, "Feast of the Immaculate Conception", "Catholic feast day"),
    (12, 25, "Christmas Day", "Celebration of the nativity"),
    (12, 30, "Rizal Day", "Death anniversary of Jose Rizal"),
    (12, 31, "Last Day of the Year", "Special non-working day"),
];

pub(super) struct GroupingSeed {
    pub name: &'static str,
    pub description: &'static str,
    pub debit_credit: &'static str,
    pub from_code: f64,
    pub to_code: f64,
    /// `(name, description)` of the ledger definitions under this grouping.
    pub definitions: &'static [(&'static str, &'static str)],
}

pub(super) const GENERAL_LEDGER: &[GroupingSeed] = &[
    GroupingSeed {
        name: "Assets",
        description: "Resources owned by the cooperative",
        debit_credit: "debit",
        from_code: 1000.0,
        to_code: 1999.0,
        definitions: &[
            ("Cash on Hand", "Teller and vault cash"),
            ("Cash in Bank", "Deposits held with partner banks"),
            ("Loans Receivable", "Outstanding principal of member loans"),
        ],
    },
    GroupingSeed {
        name: "Liabilities",
        description: "Obligations owed to members and third parties",
        debit_credit: "credit",
        from_code: 2000.0,
        to_code: 2999.0,
        definitions: &[
            ("Savings Deposits", "Withdrawable member savings"),
            ("Time Deposits", "Fixed-term member deposits"),
        ],
    },
    GroupingSeed {
        name: "Equity",
        description: "Members' ownership in the cooperative",
        debit_credit: "credit",
        from_code: 3000.0,
        to_code: 3999.0,
        definitions: &[("Share Capital", "Paid-up share capital of members")],
    },
    GroupingSeed {
        name: "Income",
        description: "Revenue from lending and services",
        debit_credit: "credit",
        from_code: 4000.0,
        to_code: 4999.0,
        definitions: &[
            ("Interest Income from Loans", "Interest earned on member loans"),
            ("Service Fees", "Membership and processing fees"),
        ],
    },
    GroupingSeed {
        name: "Expenses",
        description: "Costs of operating the cooperative",
        debit_credit: "debit",
        from_code: 5000.0,
        to_code: 5999.0,
        definitions: &[
            ("Salaries and Wages", "Staff compensation"),
            ("Utilities", "Power, water and communications"),
        ],
    },
];

pub(super) struct AccountSeed {
    pub definition: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub account_type: &'static str,
    pub min_amount: f64,
    pub max_amount: f64,
    pub interest_standard: f64,
    pub is_internal: bool,
}

pub(super) const ACCOUNTS: &[AccountSeed] = &[
    AccountSeed {
        definition: "Savings Deposits",
        name: "Regular Savings",
        description: "Withdrawable savings for members",
        account_type: "Deposit",
        min_amount: 100.0,
        max_amount: 1_000_000.0,
        interest_standard: 0.5,
        is_internal: false,
    },
    AccountSeed {
        definition: "Time Deposits",
        name: "Time Deposit 12 Months",
        description: "Twelve-month fixed deposit",
        account_type: "TimeDeposit",
        min_amount: 10_000.0,
        max_amount: 5_000_000.0,
        interest_standard: 3.0,
        is_internal: false,
    },
    AccountSeed {
        definition: "Share Capital",
        name: "Share Capital",
        description: "Paid-up share capital",
        account_type: "Deposit",
        min_amount: 500.0,
        max_amount: 1_000_000.0,
        interest_standard: 0.0,
        is_internal: false,
    },
    AccountSeed {
        definition: "Loans Receivable",
        name: "Regular Loan",
        description: "General-purpose member loan",
        account_type: "Loan",
        min_amount: 5_000.0,
        max_amount: 500_000.0,
        interest_standard: 12.0,
        is_internal: false,
    },
    AccountSeed {
        definition: "Loans Receivable",
        name: "Emergency Loan",
        description: "Short-term loan for emergencies",
        account_type: "Loan",
        min_amount: 1_000.0,
        max_amount: 50_000.0,
        interest_standard: 10.0,
        is_internal: false,
    },
    AccountSeed {
        definition: "Cash on Hand",
        name: "Cash on Hand",
        description: "Teller cash account",
        account_type: "Other",
        min_amount: 0.0,
        max_amount: 0.0,
        interest_standard: 0.0,
        is_internal: true,
    },
    AccountSeed {
        definition: "Service Fees",
        name: "Membership Fee",
        description: "One-time membership fee",
        account_type: "Fines",
        min_amount: 0.0,
        max_amount: 0.0,
        interest_standard: 0.0,
        is_internal: true,
    },
];

/// `(name, description)`
pub(super) const ACCOUNT_CLASSIFICATIONS: &[(&str, &str)] = &[
    ("Assets", "Resources owned by the organization that have economic value"),
    ("Liabilities", "Obligations owed to external parties including deposits"),
    ("Equity", "Members' ownership and capital contributions"),
    ("Income", "Revenue from operations including interest and fees"),
    ("Expenses", "Costs incurred in operations"),
];

/// `(name, description)`
pub(super) const ACCOUNT_CATEGORIES: &[(&str, &str)] = &[
    ("Deposit", "Member deposit products"),
    ("Loan", "Member lending products"),
    ("Share Capital", "Capital build-up accounts"),
    ("Fines", "Penalties and fees"),
    ("Interest", "Interest earning and paying accounts"),
    ("Other", "Internal and miscellaneous accounts"),
];

/// `(name, description)`
pub(super) const MEMBER_CLASSIFICATIONS: &[(&str, &str)] = &[
    ("Regular", "Voting members who completed all membership requirements"),
    ("Associate", "Members without voting rights"),
    ("Laboratory", "Minors enrolled by a parent or guardian"),
];

/// `(classification, name, prefix, description)`; an empty classification
/// leaves the type unclassified.
pub(super) const MEMBER_TYPES: &[(&str, &str, &str, &str)] = &[
    ("Regular", "Individual", "IND", "Natural person regular member"),
    ("Associate", "Associate Member", "ASC", "Natural person associate member"),
    ("Laboratory", "Youth Saver", "YTH", "Laboratory cooperative member"),
    ("", "Closed", "CLS", "Membership closed or withdrawn"),
];

/// `(icon, name, description)`
pub(super) const COLLATERALS: &[(&str, &str, &str)] = &[
    ("car", "Vehicle", "Registered cars, motorcycles and tricycles"),
    ("house", "Real Estate", "House and lot or condominium unit"),
    ("landmark", "Land Title", "Transfer certificate of title"),
    ("gem", "Jewelry", "Gold and precious stones"),
    ("piggy-bank", "Deposit Hold-out", "Savings or time deposit held as security"),
    ("users", "Co-maker", "Guarantee of a co-maker member"),
];

/// `(name, icon, color, description)`
pub(super) const LOAN_STATUSES: &[(&str, &str, &str, &str)] = &[
    ("Pending", "clock", "#f59e0b", "Application submitted, awaiting review"),
    ("Approved", "check", "#22c55e", "Approved and awaiting release"),
    ("Released", "send", "#3b82f6", "Proceeds released to the member"),
    ("Current", "activity", "#10b981", "Amortizations paid on schedule"),
    ("Past Due", "alert-triangle", "#ef4444", "One or more amortizations missed"),
    ("Fully Paid", "badge-check", "#6366f1", "Loan settled in full"),
    ("Written Off", "x-circle", "#6b7280", "Uncollectible balance written off"),
];
