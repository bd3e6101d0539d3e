//! The 100-day curriculum: four phases, seven themed emails each.
//!
//! This table is the single source of truth for what gets generated and
//! when. Entry order is a contract with the generator: the i-th draft a
//! phase produces corresponds to the i-th entry here. Editing counts, days
//! or themes is a data change only; the orchestrator never hardcodes them.

/// One planned email: delivery day (1-indexed from enrollment day) plus the
/// theme brief handed to the generator
#[derive(Debug)]
pub struct CurriculumEntry {
    pub day: u32,
    pub theme: &'static str,
}

#[derive(Debug)]
pub struct Phase {
    pub id: &'static str,
    pub label: &'static str,
    pub entries: Vec<CurriculumEntry>,
}

macro_rules! entries {
    ($(($day:expr, $theme:expr)),+ $(,)?) => {
        vec![$(CurriculumEntry { day: $day, theme: $theme }),+]
    };
}

lazy_static::lazy_static! {
    static ref PHASES: Vec<Phase> = vec![
        Phase {
            id: "phase1",
            label: "Phase 1 — Wake Up",
            entries: entries![
                (1, "Your First Move This Week: one concrete action specific to their role they can do in the next 48 hours"),
                (3, "The Machines Are Already Here: name specific AI tools already replacing parts of their exact job today"),
                (5, "What You're Actually Good At: identify transferable human strengths beneath their job title"),
                (8, "The Skill Gap Audit: a structured self-assessment exercise mapping current vs. needed skills"),
                (12, "Pick One Skill. Just One: the single most valuable capability to develop now, with a concrete learning path"),
                (17, "Your First Learning Habit: a daily micro-habit for skill acquisition under 20 minutes"),
                (20, "Check In: normalise the discomfort of transition. What has shifted? What feels hard?"),
            ],
        },
        Phase {
            id: "phase2",
            label: "Phase 2 — Rebuild",
            entries: entries![
                (21, "Who Are You Without Your Title? A journaling exercise to explore identity beyond career"),
                (25, "The Comparison Trap: why watching colleagues get displaced triggers shame and how to redirect it"),
                (30, "Your Human Moat: the 3 qualities AGI will never replicate — lean into them hard"),
                (35, "Mid-Point Skill Check: celebrate progress honestly and adjust the learning plan"),
                (40, "Relationships as Infrastructure: building professional trust that outlasts any technology shift"),
                (45, "The Story You Tell Yourself: rewriting the narrative from threatened to intentionally transitioning"),
                (50, "Half-Time Report: a structured 50-day reflection. What has genuinely changed?"),
            ],
        },
        Phase {
            id: "phase3",
            label: "Phase 3 — Reposition",
            entries: entries![
                (51, "The Hybrid Worker Advantage: positioning as someone who directs AI, not competes with it"),
                (55, "Build Something Small: start a real project using AI as a collaborator — specific to their field"),
                (60, "Your Personal Advisory Board: identify 3 people for a real mentorship relationship right now"),
                (65, "The Portfolio Mindset: why a single job is the riskiest position — thinking in parallel income streams"),
                (70, "Communicating Your Value: how to talk about their evolution to employers or clients concretely"),
                (75, "Emotional Resilience Under Uncertainty: a practical toolkit for managing anxiety mid-shift"),
                (80, "The Crisis You Avoided: visualise who they'd be in 2 years if they had done nothing"),
            ],
        },
        Phase {
            id: "phase4",
            label: "Phase 4 — Transcend",
            entries: entries![
                (81, "What Does Flourishing Look Like For You? A deep values excavation exercise"),
                (85, "Legacy Without a Job Title: what mark they want to leave, independent of career"),
                (88, "The Community You Belong To: finding or building a tribe navigating the same transition"),
                (91, "Money, Meaning, and the New Economy: rethinking financial security in an AGI world"),
                (95, "Gratitude for the Disruption: genuine appreciation for being forced to evolve before it was too late"),
                (98, "Letter to Yourself in One Year: projecting forward with radical honesty and intention"),
                (100, "Who Are You Now? The final reflection and their next 100-day challenge"),
            ],
        },
    ];
}

/// The full curriculum, in delivery order
pub fn phases() -> &'static [Phase] {
    debug_assert!(days_strictly_increasing(&PHASES));
    &PHASES
}

/// Total number of planned emails across all phases
pub fn total_entries() -> usize {
    phases().iter().map(|p| p.entries.len()).sum()
}

fn days_strictly_increasing(phases: &[Phase]) -> bool {
    let mut last = 0;
    for entry in phases.iter().flat_map(|p| p.entries.iter()) {
        if entry.day <= last {
            return false;
        }
        last = entry.day;
    }
    true
}
