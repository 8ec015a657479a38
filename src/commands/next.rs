use crate::briefing::generate_briefing;
use crate::calendar::RelevantEvent;
use crate::commands::CommandContext;
use crate::contacts::ContactStore;
use log::info;

/// Brief the soonest relevant meeting, if there is one.
pub async fn run(ctx: &CommandContext, upcoming: &[RelevantEvent], contacts: &dyn ContactStore) {
    let Some(relevant) = upcoming.first() else {
        info!("No upcoming meetings with attendees");
        return;
    };
    let research = ctx.gather_research(&relevant.attendees, contacts).await;
    println!("{}", generate_briefing(relevant, contacts, &research));
}
