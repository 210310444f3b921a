//! Colonist progress: learning by doing, schooling, idle-input warnings

use rand::Rng;

use crate::core::error::Result;
use crate::game::Game;
use crate::model::{MessageType, ModelMessage, UnitLocation};
use crate::registry::ObjectId;
use crate::rules::{Ability, UnitTypeId};
use crate::sync::{ChangeSet, See};

use super::production::{ProductionReport, WorkSite};

/// Accrue experience for workers producing goods that has an expert
///
/// Each worker gains its site's output divided by the number of workers
/// there, capped by configuration. A worker then becomes the expert with
/// probability experience / odds.
pub fn gain_experience<R: Rng>(
    game: &mut Game,
    report: &ProductionReport,
    rng: &mut R,
    cs: &mut ChangeSet,
) -> Result<usize> {
    let cap = game.config.max_experience;
    let odds = game.config.experience_upgrade_odds.max(1);
    let mut upgrades = 0;
    for site in &report.sites {
        if site.units.is_empty() {
            continue;
        }
        for (goods, amount) in site.produced.iter().filter(|(_, n)| *n > 0) {
            let Some(expert) = game.rules.expert_for(*goods) else { continue };
            let share = amount / site.units.len() as u32;
            for unit_id in &site.units {
                let (owner, upgrade) = {
                    let rules = std::sync::Arc::clone(&game.rules);
                    let unit = game.unit_mut(unit_id)?;
                    if unit.work_type != Some(*goods) || unit.unit_type == expert {
                        continue;
                    }
                    if !rules.unit_type(unit.unit_type).can_gain_experience() {
                        continue;
                    }
                    unit.experience = (unit.experience + share).min(cap);
                    let upgrade = rng.gen_range(0..odds) < unit.experience;
                    (unit.owner.clone(), upgrade)
                };
                cs.add_partial(See::only(&owner), unit_id.clone(), &["experience"]);
                if upgrade {
                    let from = game.rules.unit_type(game.unit(unit_id)?.unit_type).name.clone();
                    game.change_unit_type(unit_id, expert)?;
                    cs.add_message(
                        &owner,
                        ModelMessage::new(MessageType::UnitImproved, "model.unit.experience", unit_id)
                            .with("oldName", from)
                            .with("unit", &game.rules.unit_type(expert).name),
                    );
                    upgrades += 1;
                }
            }
        }
    }
    Ok(upgrades)
}

/// Warn about buildings that ran short of input
pub fn check_missing_input(game: &Game, colony_id: &ObjectId, report: &ProductionReport, cs: &mut ChangeSet) {
    let Ok(colony) = game.colony(colony_id) else { return };
    for site in &report.sites {
        let (WorkSite::Building(building_id), Some((input, missing))) = (&site.site, site.shortfall) else {
            continue;
        };
        let Ok(building) = game.building(building_id) else { continue };
        let bt = game.rules.building_type(building.building_type);
        let produced = site.produced.first().map(|(_, n)| *n).unwrap_or(0);
        let key = if produced == 0 {
            "model.building.notEnoughInput"
        } else {
            "model.building.lowInput"
        };
        cs.add_message(
            &colony.owner,
            ModelMessage::new(MessageType::MissingGoods, key, building_id)
                .with("colony", &colony.name)
                .with("building", &bt.name)
                .with("inputGoods", &game.rules.goods(input).name)
                .with("number", missing),
        );
    }
}

/// What `student` becomes when taught by `teacher`
fn teach_result(game: &Game, teacher: UnitTypeId, student: UnitTypeId) -> Option<UnitTypeId> {
    let rules = &game.rules;
    let s = rules.unit_type(student);
    let t = rules.unit_type(teacher);
    if !s.is_person() || s.skill >= t.skill {
        return None;
    }
    match s.education_target {
        Some(target) => Some(target),
        None if s.skill == 0 => Some(teacher),
        None => None,
    }
}

/// Advance every teacher in the colony's schools by one turn
///
/// A teacher without a student picks the first eligible worker outside the
/// schools. Once the teacher's education turns have passed the student
/// changes type and both are freed.
pub fn check_teaching(game: &mut Game, colony_id: &ObjectId, cs: &mut ChangeSet) -> Result<usize> {
    let (owner, schools, name) = {
        let c = game.colony(colony_id)?;
        let schools: Vec<ObjectId> = game
            .colony_buildings(c)
            .filter(|b| game.rules.building_type(b.building_type).has_ability(Ability::Teach))
            .map(|b| b.id.clone())
            .collect();
        (c.owner.clone(), schools, c.name.clone())
    };
    let mut graduated = 0;
    for school in &schools {
        let teachers = game.building(school)?.units.clone();
        for teacher in teachers {
            let (teacher_type, student) = {
                let t = game.unit(&teacher)?;
                (t.unit_type, t.student.clone())
            };
            let student = match student {
                Some(s) if game.unit(&s).is_ok() => s,
                _ => match find_student(game, colony_id, &schools, teacher_type) {
                    Some(s) => {
                        game.unit_mut(&s)?.teacher = Some(teacher.clone());
                        let t = game.unit_mut(&teacher)?;
                        t.student = Some(s.clone());
                        t.turns_of_training = 0;
                        s
                    }
                    None => {
                        game.unit_mut(&teacher)?.student = None;
                        continue;
                    }
                },
            };

            let turns = {
                let t = game.unit_mut(&teacher)?;
                t.turns_of_training += 1;
                t.turns_of_training
            };
            let needed = game.rules.unit_type(teacher_type).education_turns;
            if turns < needed {
                continue;
            }
            let student_type = game.unit(&student)?.unit_type;
            let Some(result) = teach_result(game, teacher_type, student_type) else {
                game.unit_mut(&teacher)?.student = None;
                game.unit_mut(&student)?.teacher = None;
                continue;
            };
            let old_name = game.rules.unit_type(student_type).name.clone();
            game.change_unit_type(&student, result)?;
            game.unit_mut(&student)?.teacher = None;
            let t = game.unit_mut(&teacher)?;
            t.student = None;
            t.turns_of_training = 0;
            cs.add_message(
                &owner,
                ModelMessage::new(MessageType::UnitImproved, "model.unit.unitEducated", &student)
                    .with("colony", &name)
                    .with("oldName", old_name)
                    .with("unit", &game.rules.unit_type(result).name),
            );
            cs.add_partial(See::only(&owner), student, &["unit_type"]);
            graduated += 1;
        }
    }
    Ok(graduated)
}

fn find_student(game: &Game, colony_id: &ObjectId, schools: &[ObjectId], teacher_type: UnitTypeId) -> Option<ObjectId> {
    game.colony_units(colony_id).into_iter().find(|id| {
        game.unit(id).is_ok_and(|u| {
            let in_school = matches!(&u.location, UnitLocation::Building(b) if schools.contains(b));
            !in_school && u.teacher.is_none() && teach_result(game, teacher_type, u.unit_type).is_some()
        })
    })
}
