/// A purchase tier. Prices live server-side only; the client sends a plan
/// id and nothing else about money is trusted from it.
#[derive(Debug, Clone, Copy)]
pub struct Plan {
    pub id: &'static str,
    pub credits: i32,
    /// Price in major currency units.
    pub amount: i64,
}

pub const PLANS: &[Plan] = &[
    Plan {
        id: "Basic",
        credits: 100,
        amount: 10,
    },
    Plan {
        id: "Advanced",
        credits: 500,
        amount: 50,
    },
    Plan {
        id: "Business",
        credits: 5000,
        amount: 250,
    },
];

pub fn find_plan(plan_id: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|p| p.id == plan_id)
}
