//! Steal/package round. The host assigns an acting team and a point package;
//! the acting team works through the package's questions. A wrong answer on
//! its own question costs the full value and opens a short buzzer window in
//! which any other team may race to steal; a failed steal costs nothing. The
//! one-time hope star doubles a flagged team's correct delta and is consumed
//! the moment it is flagged.

use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    engine::{
        EngineError,
        buzzer::{BuzzerPress, BuzzerRace, TeamId},
        clock::TimerWindow,
        scoring::{AttemptKind, Judgment, steal_delta, with_hope_star},
    },
    rounds::{Question, ScoreEvent, TeamAnswer, validate_question},
};

/// Phase of the steal/package round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum StealPhase {
    /// Round not started.
    Idle,
    /// Host picks the next acting team.
    TeamSelection,
    /// Host picks a package for the acting team.
    PackageSelection,
    /// Question on deck; hope stars may be flagged now.
    QuestionPreparing,
    /// Acting team answers its own question against the clock.
    QuestionOpen,
    /// An answer awaits the host's ruling.
    WaitingJudgment {
        /// Whether the pending answer is an own-question or steal attempt.
        attempt: AttemptKind,
    },
    /// Other teams race to contest the failed question.
    BuzzerWindow,
    /// The race winner answers once.
    WaitingAnswer {
        /// Team that won the buzzer race.
        stealer: TeamId,
    },
    /// Question settled; answer shown.
    AnswerRevealed,
    /// Every package has been played.
    Finished,
}

/// A fixed ordered set of questions worth a common point tier.
#[derive(Debug, Clone)]
pub struct Package {
    /// Display label, e.g. `"40-40-40"`.
    pub label: String,
    questions: Vec<Question>,
    taken_by: Option<TeamId>,
}

impl Package {
    /// Questions in play order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Team that selected this package, if any.
    pub fn taken_by(&self) -> Option<TeamId> {
        self.taken_by
    }
}

/// State machine for the steal/package round.
#[derive(Debug, Clone)]
pub struct StealRound {
    packages: Vec<Package>,
    buzzer_window: Duration,
    phase: StealPhase,
    main_team: Option<TeamId>,
    served_teams: Vec<TeamId>,
    current: Option<(usize, usize)>,
    window: TimerWindow,
    race: BuzzerRace,
    answers: Vec<TeamAnswer>,
    hope_star_flags: Vec<TeamId>,
}

impl StealRound {
    /// Build the round from its packages and the fixed steal-window duration.
    pub fn new(
        packages: Vec<(String, Vec<Question>)>,
        buzzer_window: Duration,
    ) -> Result<Self, EngineError> {
        if packages.is_empty() {
            return Err(EngineError::ValidationFailed(
                "steal round requires at least one package".into(),
            ));
        }
        for (label, questions) in &packages {
            if questions.is_empty() {
                return Err(EngineError::ValidationFailed(format!(
                    "package `{label}` has no questions"
                )));
            }
            for question in questions {
                validate_question(question, true)?;
            }
        }
        Ok(Self {
            packages: packages
                .into_iter()
                .map(|(label, questions)| Package {
                    label,
                    questions,
                    taken_by: None,
                })
                .collect(),
            buzzer_window,
            phase: StealPhase::Idle,
            main_team: None,
            served_teams: Vec::new(),
            current: None,
            window: TimerWindow::armed(Duration::ZERO),
            race: BuzzerRace::new(),
            answers: Vec::new(),
            hope_star_flags: Vec::new(),
        })
    }

    /// Current phase.
    pub fn phase(&self) -> StealPhase {
        self.phase
    }

    /// Acting team for the current turn.
    pub fn main_team(&self) -> Option<TeamId> {
        self.main_team
    }

    /// All packages in display order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Teams that have already played their package.
    pub fn served_teams(&self) -> &[TeamId] {
        &self.served_teams
    }

    /// Question currently in play.
    pub fn current_question(&self) -> Option<&Question> {
        self.current
            .and_then(|(pkg, idx)| self.packages.get(pkg)?.questions.get(idx))
    }

    /// Package and question indices currently in play.
    pub fn current_position(&self) -> Option<(usize, usize)> {
        self.current
    }

    /// The active timer window.
    pub fn window(&self) -> &TimerWindow {
        &self.window
    }

    /// Presses recorded during the current buzzer window.
    pub fn presses(&self) -> &[BuzzerPress] {
        self.race.presses()
    }

    /// Answers recorded for the current question.
    pub fn answers(&self) -> &[TeamAnswer] {
        &self.answers
    }

    /// Teams that flagged their hope star for the current question.
    pub fn hope_star_flags(&self) -> &[TeamId] {
        &self.hope_star_flags
    }

    /// Start the round: move from idle to team selection.
    pub fn start(&mut self) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::Idle) {
            return Err(EngineError::invalid(self.phase, "advance"));
        }
        self.phase = StealPhase::TeamSelection;
        Ok(self.phase)
    }

    /// Host assigns the acting team for this turn.
    pub fn assign_main_team(&mut self, team_id: TeamId) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::TeamSelection) {
            return Err(EngineError::invalid(self.phase, "assign-main-team"));
        }
        if self.served_teams.contains(&team_id) {
            return Err(EngineError::ValidationFailed(format!(
                "team {team_id} has already played its package"
            )));
        }
        self.main_team = Some(team_id);
        self.phase = StealPhase::PackageSelection;
        Ok(self.phase)
    }

    /// Host locks a still-available package for the acting team.
    pub fn select_package(&mut self, package: usize) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::PackageSelection) {
            return Err(EngineError::invalid(self.phase, "select-package"));
        }
        let main = self.expect_main_team()?;
        let entry = self
            .packages
            .get_mut(package)
            .ok_or_else(|| EngineError::NotFound(format!("package {package} does not exist")))?;
        if let Some(owner) = entry.taken_by {
            return Err(EngineError::ValidationFailed(format!(
                "package {package} already taken by team {owner}"
            )));
        }
        entry.taken_by = Some(main);
        self.current = Some((package, 0));
        self.answers.clear();
        self.hope_star_flags.clear();
        self.phase = StealPhase::QuestionPreparing;
        Ok(self.phase)
    }

    /// A team flags its one-time hope star for the question on deck. The
    /// caller is responsible for checking that the team still holds the star;
    /// the machine only guards against double-flagging within one question.
    pub fn flag_hope_star(&mut self, team_id: TeamId) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::QuestionPreparing) {
            return Err(EngineError::invalid(self.phase, "flag-hope-star"));
        }
        if self.hope_star_flags.contains(&team_id) {
            return Err(EngineError::ValidationFailed(format!(
                "team {team_id} already flagged the hope star for this question"
            )));
        }
        self.hope_star_flags.push(team_id);
        Ok(self.phase)
    }

    /// Host opens the prepared question and starts its clock.
    pub fn open_question(&mut self, now: Instant) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::QuestionPreparing) {
            return Err(EngineError::invalid(self.phase, "open-question"));
        }
        let question = self
            .current_question()
            .ok_or_else(|| EngineError::NotFound("no question on deck".into()))?;
        self.window = TimerWindow::start(Duration::from_secs(question.time_limit_secs), now);
        self.race.clear();
        self.phase = StealPhase::QuestionOpen;
        Ok(self.phase)
    }

    /// Accept an answer: the acting team while the question is open, or the
    /// race winner while waiting for the steal answer.
    pub fn submit_answer(
        &mut self,
        team_id: TeamId,
        team_name: &str,
        text: String,
        now: Instant,
    ) -> Result<StealPhase, EngineError> {
        match self.phase {
            StealPhase::QuestionOpen => {
                let main = self.expect_main_team()?;
                if team_id != main {
                    return Err(EngineError::ValidationFailed(format!(
                        "only the acting team {main} may answer its own question"
                    )));
                }
                if self.window.is_expired(now) {
                    return Err(EngineError::WindowClosed("answer window has expired".into()));
                }
                let mut answer = TeamAnswer::new(
                    team_id,
                    team_name.to_string(),
                    text,
                    self.window.elapsed_ms(now).unwrap_or(0),
                );
                answer.is_main_team = true;
                answer.used_hope_star = self.hope_star_flags.contains(&team_id);
                self.answers.push(answer);
                self.phase = StealPhase::WaitingJudgment {
                    attempt: AttemptKind::OwnQuestion,
                };
                Ok(self.phase)
            }
            StealPhase::WaitingAnswer { stealer } => {
                if team_id != stealer {
                    return Err(EngineError::ValidationFailed(format!(
                        "only the race winner {stealer} may answer the steal"
                    )));
                }
                let mut answer = TeamAnswer::new(
                    team_id,
                    team_name.to_string(),
                    text,
                    self.window.elapsed_ms(now).unwrap_or(0),
                );
                answer.used_hope_star = self.hope_star_flags.contains(&team_id);
                self.answers.push(answer);
                self.phase = StealPhase::WaitingJudgment {
                    attempt: AttemptKind::Steal,
                };
                Ok(self.phase)
            }
            _ => Err(EngineError::invalid(self.phase, "submit-answer")),
        }
    }

    /// Close an unanswered question: the acting team earns nothing and the
    /// steal window opens immediately.
    pub fn close_question(&mut self, now: Instant) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::QuestionOpen) {
            return Err(EngineError::invalid(self.phase, "force-close"));
        }
        self.open_buzzer_window(now);
        Ok(self.phase)
    }

    /// Host rules on the pending answer. A wrong own-question answer opens
    /// the steal window; any steal judgment is terminal for the question.
    pub fn judge(
        &mut self,
        judgment: Judgment,
        now: Instant,
    ) -> Result<(StealPhase, Vec<ScoreEvent>), EngineError> {
        let StealPhase::WaitingJudgment { attempt } = self.phase else {
            return Err(EngineError::invalid(self.phase, "judge-answer"));
        };
        let points = self
            .current_question()
            .ok_or_else(|| EngineError::NotFound("no active question".into()))?
            .points;
        let answer = self
            .answers
            .iter_mut()
            .rev()
            .find(|a| !a.judgment.is_terminal())
            .ok_or_else(|| EngineError::NotFound("no pending answer".into()))?;
        answer.judge(judgment)?;
        let delta = with_hope_star(steal_delta(attempt, judgment, points), answer.used_hope_star);
        answer.settle(delta)?;
        let team_id = answer.team_id;

        let mut events = Vec::new();
        if delta != 0 {
            let reason = match attempt {
                AttemptKind::OwnQuestion => "package answer",
                AttemptKind::Steal => "steal answer",
            };
            events.push(ScoreEvent::new(team_id, delta, reason));
        }

        self.phase = match (attempt, judgment) {
            (AttemptKind::OwnQuestion, Judgment::Incorrect) => {
                self.open_buzzer_window(now);
                self.phase
            }
            _ => StealPhase::AnswerRevealed,
        };
        Ok((self.phase, events))
    }

    /// A non-acting team races to contest the failed question.
    pub fn press(
        &mut self,
        team_id: TeamId,
        team_name: &str,
        now: Instant,
    ) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::BuzzerWindow) {
            return Err(EngineError::invalid(self.phase, "press-buzzer"));
        }
        if Some(team_id) == self.main_team {
            return Err(EngineError::ValidationFailed(
                "the acting team cannot steal its own question".into(),
            ));
        }
        if self.window.is_expired(now) {
            return Err(EngineError::WindowClosed("steal window has expired".into()));
        }
        self.race.record(BuzzerPress {
            team_id,
            team_name: team_name.to_string(),
            at_ms: self.window.elapsed_ms(now).unwrap_or(0),
        })?;
        Ok(self.phase)
    }

    /// Close the steal window and resolve the race. With no contender the
    /// question is settled without a second attempt.
    pub fn close_buzzer_window(&mut self) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::BuzzerWindow) {
            return Err(EngineError::invalid(self.phase, "force-close"));
        }
        self.phase = match self.race.winner() {
            Some(winner) => StealPhase::WaitingAnswer {
                stealer: winner.team_id,
            },
            None => StealPhase::AnswerRevealed,
        };
        Ok(self.phase)
    }

    /// Move to the next question, the next acting team, or finish.
    pub fn advance(&mut self) -> Result<StealPhase, EngineError> {
        if !matches!(self.phase, StealPhase::AnswerRevealed) {
            return Err(EngineError::invalid(self.phase, "advance"));
        }
        let (pkg, idx) = self
            .current
            .ok_or_else(|| EngineError::NotFound("no active package".into()))?;

        if idx + 1 < self.packages[pkg].questions.len() {
            self.current = Some((pkg, idx + 1));
            self.answers.clear();
            self.hope_star_flags.clear();
            self.race.clear();
            self.phase = StealPhase::QuestionPreparing;
            return Ok(self.phase);
        }

        if let Some(main) = self.main_team.take() {
            self.served_teams.push(main);
        }
        self.current = None;
        self.answers.clear();
        self.hope_star_flags.clear();
        self.race.clear();
        self.phase = if self.packages.iter().any(|p| p.taken_by.is_none()) {
            StealPhase::TeamSelection
        } else {
            StealPhase::Finished
        };
        Ok(self.phase)
    }

    /// Return to the pristine idle state, releasing every package.
    pub fn reset(&mut self) {
        for package in &mut self.packages {
            package.taken_by = None;
        }
        self.phase = StealPhase::Idle;
        self.main_team = None;
        self.served_teams.clear();
        self.current = None;
        self.window = TimerWindow::armed(Duration::ZERO);
        self.race.clear();
        self.answers.clear();
        self.hope_star_flags.clear();
    }

    fn expect_main_team(&self) -> Result<TeamId, EngineError> {
        self.main_team
            .ok_or_else(|| EngineError::NotFound("no acting team assigned".into()))
    }

    fn open_buzzer_window(&mut self, now: Instant) {
        self.window = TimerWindow::start(self.buzzer_window, now);
        self.race.clear();
        self.phase = StealPhase::BuzzerWindow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round() -> StealRound {
        let package = |label: &str, points: i32| {
            (
                label.to_string(),
                (0..2)
                    .map(|i| Question {
                        text: format!("{label} question {i}"),
                        options: vec![],
                        answer: Some(format!("{label} answer {i}")),
                        correct_index: None,
                        points,
                        time_limit_secs: 15,
                    })
                    .collect(),
            )
        };
        StealRound::new(
            vec![package("20s", 20), package("30s", 30)],
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn to_first_question(round: &mut StealRound, team: TeamId, package: usize) -> Instant {
        round.start().unwrap();
        round.assign_main_team(team).unwrap();
        round.select_package(package).unwrap();
        let t0 = Instant::now();
        round.open_question(t0).unwrap();
        t0
    }

    #[test]
    fn steal_full_cycle_matches_the_scoring_rules() {
        let mut round = round();
        let t0 = to_first_question(&mut round, 1, 0);

        round
            .submit_answer(1, "alpha", "wrong".into(), t0 + Duration::from_secs(3))
            .unwrap();
        let (phase, events) = round
            .judge(Judgment::Incorrect, t0 + Duration::from_secs(4))
            .unwrap();
        assert_eq!(phase, StealPhase::BuzzerWindow);
        assert_eq!(events, vec![ScoreEvent::new(1, -20, "package answer")]);

        round.press(2, "beta", t0 + Duration::from_secs(5)).unwrap();
        round.press(3, "gamma", t0 + Duration::from_secs(6)).unwrap();
        let phase = round.close_buzzer_window().unwrap();
        assert_eq!(phase, StealPhase::WaitingAnswer { stealer: 2 });

        round
            .submit_answer(2, "beta", "20s answer 0".into(), t0 + Duration::from_secs(8))
            .unwrap();
        let (phase, events) = round
            .judge(Judgment::Correct, t0 + Duration::from_secs(9))
            .unwrap();
        assert_eq!(phase, StealPhase::AnswerRevealed);
        assert_eq!(events, vec![ScoreEvent::new(2, 20, "steal answer")]);

        assert_eq!(round.answers().len(), 2);
        assert!(round.answers().iter().all(|a| a.judgment.is_terminal()));
    }

    #[test]
    fn failed_steal_costs_nothing() {
        let mut round = round();
        let t0 = to_first_question(&mut round, 1, 0);
        round.close_question(t0 + Duration::from_secs(16)).unwrap();
        round.press(3, "gamma", t0 + Duration::from_secs(17)).unwrap();
        round.close_buzzer_window().unwrap();
        round
            .submit_answer(3, "gamma", "wrong".into(), t0 + Duration::from_secs(18))
            .unwrap();

        let (phase, events) = round
            .judge(Judgment::Incorrect, t0 + Duration::from_secs(19))
            .unwrap();
        assert_eq!(phase, StealPhase::AnswerRevealed);
        assert!(events.is_empty());
    }

    #[test]
    fn hope_star_doubles_a_correct_own_answer_only() {
        let mut round = round();
        round.start().unwrap();
        round.assign_main_team(1).unwrap();
        round.select_package(1).unwrap();
        round.flag_hope_star(1).unwrap();
        let t0 = Instant::now();
        round.open_question(t0).unwrap();
        round
            .submit_answer(1, "alpha", "30s answer 0".into(), t0 + Duration::from_secs(2))
            .unwrap();

        let (_, events) = round
            .judge(Judgment::Correct, t0 + Duration::from_secs(3))
            .unwrap();
        assert_eq!(events, vec![ScoreEvent::new(1, 60, "package answer")]);
    }

    #[test]
    fn hope_star_never_doubles_the_penalty() {
        let mut round = round();
        round.start().unwrap();
        round.assign_main_team(1).unwrap();
        round.select_package(1).unwrap();
        round.flag_hope_star(1).unwrap();
        let t0 = Instant::now();
        round.open_question(t0).unwrap();
        round
            .submit_answer(1, "alpha", "wrong".into(), t0 + Duration::from_secs(2))
            .unwrap();

        let (_, events) = round
            .judge(Judgment::Incorrect, t0 + Duration::from_secs(3))
            .unwrap();
        assert_eq!(events, vec![ScoreEvent::new(1, -30, "package answer")]);
    }

    #[test]
    fn acting_team_cannot_steal_and_duplicates_are_rejected() {
        let mut round = round();
        let t0 = to_first_question(&mut round, 1, 0);
        round.close_question(t0 + Duration::from_secs(16)).unwrap();

        let err = round.press(1, "alpha", t0 + Duration::from_secs(17)).unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed(_)));

        round.press(2, "beta", t0 + Duration::from_secs(17)).unwrap();
        let err = round.press(2, "beta", t0 + Duration::from_secs(18)).unwrap_err();
        assert_eq!(err, EngineError::DuplicatePress(2));
        assert_eq!(round.presses().len(), 1);
    }

    #[test]
    fn press_after_steal_window_expiry_is_rejected() {
        let mut round = round();
        let t0 = to_first_question(&mut round, 1, 0);
        let close_at = t0 + Duration::from_secs(16);
        round.close_question(close_at).unwrap();

        let err = round
            .press(2, "beta", close_at + Duration::from_secs(6))
            .unwrap_err();
        assert!(matches!(err, EngineError::WindowClosed(_)));
    }

    #[test]
    fn empty_race_settles_the_question_without_a_steal() {
        let mut round = round();
        let t0 = to_first_question(&mut round, 1, 0);
        round.close_question(t0 + Duration::from_secs(16)).unwrap();
        assert_eq!(round.close_buzzer_window().unwrap(), StealPhase::AnswerRevealed);
    }

    #[test]
    fn packages_rotate_between_teams_until_exhausted() {
        let mut round = round();
        let t0 = to_first_question(&mut round, 1, 0);

        // Team 1 burns through both questions of package 0.
        for _ in 0..2 {
            round.close_question(Instant::now() + Duration::from_secs(20)).unwrap();
            round.close_buzzer_window().unwrap();
            round.advance().unwrap();
            if matches!(round.phase(), StealPhase::QuestionPreparing) {
                round.open_question(t0).unwrap();
            }
        }
        assert_eq!(round.phase(), StealPhase::TeamSelection);
        assert_eq!(round.served_teams(), &[1]);

        // Team 1 cannot act twice; package 0 cannot be taken twice.
        let err = round.assign_main_team(1).unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed(_)));
        round.assign_main_team(2).unwrap();
        let err = round.select_package(0).unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed(_)));
        round.select_package(1).unwrap();
    }
}
