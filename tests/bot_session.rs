//! End-to-end sessions against a scripted server over loopback TCP.

mod common;

use common::{CannedTitles, FakeServer, action, config};
use irc_helper::{Bot, BotError, ConnectionError};

async fn bot_for(server: &FakeServer) -> Bot {
    Bot::new(config(server.port()), None)
        .await
        .expect("bot builds")
        .with_title_fetcher(CannedTitles)
}

#[tokio::test]
async fn test_session_learns_and_answers() {
    let server = FakeServer::bind().await.unwrap();
    let mut bot = bot_for(&server).await;

    let bot_side = async {
        bot.connect().await?;
        let result = bot.run().await;
        bot.shutdown().await;
        result
    };
    let learn = r":bob!b@h PRIVMSG #room :Tooth! learn ^hello (?P<who>\w+) -> hi ${who}, love ${nick}";
    let script = async {
        let mut peer = server.accept().await?;
        peer.register().await?;

        peer.send("PING :berk").await?;
        peer.expect("PONG :berk").await?;

        peer.send(":bob!b@h JOIN #room").await?;
        peer.expect(&action("#room", "greets bob!")).await?;

        peer.send(learn).await?;
        peer.expect(&action("#room", "doesn't want to be trained by bob!")).await?;

        peer.send(":boss!b@h PRIVMSG Tooth :add_flag bob w").await?;
        peer.expect(&action("boss", "successfully added whitelist to bob, new flags: w"))
            .await?;

        peer.send(learn).await?;
        peer.expect(&action("#room", "has been trained by bob!")).await?;

        peer.send(":carol!c@h PRIVMSG #room :hello world").await?;
        peer.expect("PRIVMSG #room :hi world, love carol").await?;

        peer.send(":boss!b@h PRIVMSG Tooth :terminate").await?;
        peer.expect("QUIT :Goodbye!").await?;
        anyhow::ensure!(peer.closed().await, "bot kept the socket open");
        anyhow::Ok(())
    };

    let (bot_result, script_result) = tokio::join!(bot_side, script);
    script_result.unwrap();
    bot_result.unwrap();
    assert_eq!(bot.state(), irc_helper_proto::RegistrationState::Closed);
}

#[tokio::test]
async fn test_indifferent_handlers_let_triggers_run() {
    let server = FakeServer::bind().await.unwrap();
    let mut bot = bot_for(&server).await;
    bot.triggers()
        .learn(r"https?://", "nice link, ${nick}", Some("boss"))
        .await
        .unwrap();

    let bot_side = async {
        bot.connect().await?;
        let result = bot.run().await;
        bot.shutdown().await;
        result
    };
    let script = async {
        let mut peer = server.accept().await?;
        peer.register().await?;

        peer.send(":bob!b@h PRIVMSG #room :https://example.com").await?;
        peer.expect(&action(
            "#room",
            "finds the URL title to be: \x02\"How to Train Your Dragon\"",
        ))
        .await?;
        peer.expect("PRIVMSG #room :nice link, bob").await?;

        peer.send(":boss!b@h PRIVMSG Tooth :list_commands").await?;
        peer.expect("PRIVMSG boss :https?:// -> nice link, ${nick}").await?;

        peer.send(":boss!b@h PRIVMSG Tooth :purge_commands").await?;
        peer.expect(&action("boss", "forgot all of his tricks!")).await?;
        peer.send(":boss!b@h PRIVMSG Tooth :list_commands").await?;
        peer.expect(&action("boss", "hasn't learned any tricks yet!")).await?;
        anyhow::Ok(())
    };

    let (bot_result, script_result) = tokio::join!(bot_side, script);
    script_result.unwrap();
    // The scripted server hung up; that ends the session cleanly.
    bot_result.unwrap();
}

#[tokio::test]
async fn test_ignored_users_are_not_greeted_or_served() {
    let server = FakeServer::bind().await.unwrap();
    let mut bot = bot_for(&server).await;
    bot.triggers().learn("^hi", "hello ${nick}", None).await.unwrap();

    let bot_side = async {
        bot.connect().await?;
        let result = bot.run().await;
        bot.shutdown().await;
        result
    };
    let script = async {
        let mut peer = server.accept().await?;
        peer.register().await?;

        peer.send(":boss!b@h PRIVMSG Tooth :add_flag mallory ignore").await?;
        peer.expect(&action(
            "boss",
            "successfully added ignore to mallory, new flags: i",
        ))
        .await?;

        peer.send(":Mallory!m@h JOIN #room").await?;
        peer.send(":Mallory!m@h PRIVMSG #room :hi there").await?;
        peer.send(":boss!b@h PRIVMSG #room :Tooth! attack Mallory").await?;
        peer.expect(&action("#room", "doesn't have a valid attack for Mallory!"))
            .await?;

        peer.send(":bob!b@h PRIVMSG #room :hi there").await?;
        peer.expect("PRIVMSG #room :hello bob").await?;
        anyhow::Ok(())
    };

    let (bot_result, script_result) = tokio::join!(bot_side, script);
    script_result.unwrap();
    bot_result.unwrap();
}

#[tokio::test]
async fn test_server_hanging_up_during_handshake_is_fatal() {
    let server = FakeServer::bind().await.unwrap();
    let mut bot = bot_for(&server).await;

    let script = async {
        let mut peer = server.accept().await?;
        peer.send(":127.0.0.1 NOTICE * :*** Found your hostname").await?;
        peer.expect("USER toothless 0 * :toothless").await?;
        peer.expect("NICK Tooth").await?;
        anyhow::Ok(())
    };

    let (connected, script_result) = tokio::join!(bot.connect(), script);
    script_result.unwrap();
    let err = connected.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        BotError::Connection(ConnectionError::ClosedDuringHandshake)
    ));
    bot.shutdown().await;
}

#[tokio::test]
async fn test_interrupted_handshake_still_quits() {
    let server = FakeServer::bind().await.unwrap();
    let mut bot = bot_for(&server).await;
    let (interrupt, interrupted) = tokio::sync::oneshot::channel::<()>();

    let bot_side = async {
        tokio::select! {
            result = bot.connect() => result?,
            _ = interrupted => {}
        }
        assert_ne!(bot.state(), irc_helper_proto::RegistrationState::Closed);
        bot.shutdown().await;
        Ok::<_, BotError>(())
    };
    let script = async {
        let mut peer = server.accept().await?;
        peer.send(":127.0.0.1 NOTICE * :*** Found your hostname").await?;
        peer.expect("USER toothless 0 * :toothless").await?;
        peer.expect("NICK Tooth").await?;
        let _ = interrupt.send(());
        peer.expect("QUIT :Goodbye!").await?;
        anyhow::ensure!(peer.closed().await, "bot kept the socket open");
        anyhow::Ok(())
    };

    let (bot_result, script_result) = tokio::join!(bot_side, script);
    script_result.unwrap();
    bot_result.unwrap();
    assert_eq!(bot.state(), irc_helper_proto::RegistrationState::Closed);
}
